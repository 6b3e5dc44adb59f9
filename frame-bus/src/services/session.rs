//! Host session
//!
//! The host owns sign-in; the bus only reads who is signed in right now to
//! answer `USER_DATA_REQUEST`.

use std::sync::Arc;

use shared::message::UserSummary;
use shared::models::SessionUser;
use tokio::sync::RwLock;

/// Shared, cloneable view of the signed-in user
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: Arc<RwLock<Option<SessionUser>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self {
            current: Arc::new(RwLock::new(Some(user))),
        }
    }

    pub async fn sign_in(&self, user: SessionUser) {
        tracing::info!(user_id = %user.id, "Session signed in");
        *self.current.write().await = Some(user);
    }

    pub async fn sign_out(&self) {
        if let Some(user) = self.current.write().await.take() {
            tracing::info!(user_id = %user.id, "Session signed out");
        }
    }

    pub async fn current(&self) -> Option<SessionUser> {
        self.current.read().await.clone()
    }

    /// Summary sent to the frame, `None` when nobody is signed in
    pub async fn summary(&self) -> Option<UserSummary> {
        self.current().await.map(|user| UserSummary {
            id: user.id,
            email: user.email,
            is_logged_in: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_in_and_out() {
        let session = SessionState::new();
        assert!(session.summary().await.is_none());

        session
            .sign_in(SessionUser {
                id: "u1".into(),
                email: "a@example.com".into(),
            })
            .await;
        let summary = session.summary().await.unwrap();
        assert_eq!(summary.id, "u1");
        assert!(summary.is_logged_in);

        // Clones observe the same session
        let other = session.clone();
        other.sign_out().await;
        assert!(session.current().await.is_none());
    }
}
