use async_trait::async_trait;
use serde::de::IgnoredAny;
use shared::AppResult;
use shared::message::{MessageType, UserDataResponse};

use crate::message::{CommandHandler, Reply, RequestContext};
use crate::services::SessionState;

/// Answers with the host's signed-in user (or `null`)
pub struct UserDataHandler {
    session: SessionState,
}

impl UserDataHandler {
    pub fn new(session: SessionState) -> Self {
        Self { session }
    }
}

#[async_trait]
impl CommandHandler for UserDataHandler {
    type Request = IgnoredAny;

    async fn handle(&self, _: IgnoredAny, _ctx: RequestContext) -> AppResult<Reply> {
        let response = UserDataResponse {
            user: self.session.summary().await,
        };
        Reply::from_payload(MessageType::UserDataResponse, &response)
    }
}
