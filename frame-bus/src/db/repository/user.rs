//! User Repository (read-only)

use std::sync::Arc;

use shared::models::{USERS_COLLECTION, User};

use super::{BaseRepository, decode};
use crate::db::{EntityStore, Query, StoreResult};

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// All users, newest first
    pub async fn find_all(&self) -> StoreResult<Vec<User>> {
        self.base
            .store()
            .query(USERS_COLLECTION, &Query::newest_first())
            .await?
            .into_iter()
            .map(decode)
            .collect()
    }

    pub async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        self.base
            .store()
            .get(USERS_COLLECTION, id)
            .await?
            .map(decode)
            .transpose()
    }
}
