use std::{fmt::Debug, sync::Arc};

use tokio::sync::RwLock;

use crate::models::{NewUser, StoredUser};

use super::UserStorage;

#[derive(Clone)]
pub struct InMemoryUserStorage {
    users: Arc<RwLock<Vec<StoredUser<u64>>>>,
}

impl InMemoryUserStorage {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryUserStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for InMemoryUserStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formatter = f.debug_struct("InMemoryUserStorage");
        if let Ok(users) = self.users.try_read() {
            formatter.field("users", &users.len());
        }
        formatter.finish()
    }
}

#[async_trait::async_trait]
impl UserStorage for InMemoryUserStorage {
    type Id = u64;

    async fn insert(&self, user: NewUser) -> anyhow::Result<StoredUser<Self::Id>> {
        // Length and push happen under the same write guard, so ids never collide.
        let mut users = self.users.write().await;
        let id = users.len() as u64 + 1;
        let stored = StoredUser::new(id, user);
        users.push(stored.clone());
        tracing::debug!(id, "registered user");
        Ok(stored)
    }

    async fn list(&self) -> anyhow::Result<Vec<StoredUser<Self::Id>>> {
        let users = self.users.read().await;
        Ok(users.clone())
    }
}
