use std::fmt::Debug;

use schemars::JsonSchema;
use serde::Serialize;

use crate::models::{NewUser, StoredUser};

pub(crate) mod in_memory;
pub(crate) mod mongo;

#[async_trait::async_trait]
pub trait UserStorage: Send + Sync {
    type Id: Serialize + JsonSchema + Debug + Clone + Send + Sync + 'static;

    /// Persist `user`, returning it with its newly assigned id.
    async fn insert(&self, user: NewUser) -> anyhow::Result<StoredUser<Self::Id>>;

    async fn list(&self) -> anyhow::Result<Vec<StoredUser<Self::Id>>>;

    /// Release any resources held by the store. Called once the server has
    /// stopped accepting requests.
    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
