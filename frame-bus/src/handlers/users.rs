use std::sync::Arc;

use async_trait::async_trait;
use serde::de::IgnoredAny;
use shared::AppResult;
use shared::message::{FetchUsersResponse, MessageType};

use crate::db::EntityStore;
use crate::db::repository::UserRepository;
use crate::message::{CommandHandler, Reply, RequestContext};

/// All users, newest first
pub struct FetchUsersHandler {
    users: UserRepository,
}

impl FetchUsersHandler {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }
}

#[async_trait]
impl CommandHandler for FetchUsersHandler {
    type Request = IgnoredAny;

    async fn handle(&self, _: IgnoredAny, _ctx: RequestContext) -> AppResult<Reply> {
        let users = self.users.find_all().await?;
        Reply::from_payload(MessageType::FetchUsersResponse, &FetchUsersResponse { users })
    }
}
