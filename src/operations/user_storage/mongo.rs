use anyhow::Context;
use bson::{doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::models::{NewUser, StoredUser};

use super::UserStorage;

const COLLECTION: &str = "users";

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl From<UserDocument> for StoredUser<String> {
    fn from(document: UserDocument) -> Self {
        StoredUser::new(
            document.id.to_hex(),
            NewUser {
                first_name: document.first_name,
                last_name: document.last_name,
                email: document.email,
                password: document.password,
            },
        )
    }
}

/// Users kept in the `users` collection of a MongoDB database. Ids are the
/// hex form of the server-generated `_id`.
#[derive(Clone, Debug)]
pub struct MongoUserStorage {
    client: Client,
    users: Collection<NewUser>,
}

impl MongoUserStorage {
    /// Connect to `uri` and ping the deployment before handing out a store.
    pub async fn connect(uri: &str, database: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("could not parse MongoDB connection string")?;
        options.app_name.get_or_insert_with(|| "manage-me".to_string());

        let client = Client::with_options(options)?;
        client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .context("could not ping MongoDB")?;

        tracing::info!(database, "connection to MongoDB established");

        Ok(Self::from_client(client, database))
    }

    pub fn from_client(client: Client, database: &str) -> Self {
        let users = client.database(database).collection(COLLECTION);
        Self { client, users }
    }
}

#[async_trait::async_trait]
impl UserStorage for MongoUserStorage {
    type Id = String;

    #[instrument(level = "debug", skip(self))]
    async fn insert(&self, user: NewUser) -> anyhow::Result<StoredUser<Self::Id>> {
        let result = self.users.insert_one(&user, None).await?;
        let Some(id) = result.inserted_id.as_object_id() else {
            anyhow::bail!("expected an ObjectId, got {}", result.inserted_id)
        };

        Ok(StoredUser::new(id.to_hex(), user))
    }

    #[instrument(level = "debug", skip(self))]
    async fn list(&self) -> anyhow::Result<Vec<StoredUser<Self::Id>>> {
        let cursor = self
            .users
            .clone_with_type::<UserDocument>()
            .find(None, None)
            .await?;

        let documents: Vec<UserDocument> = cursor
            .try_collect()
            .await
            .context("could not decode user documents")?;

        Ok(documents.into_iter().map(StoredUser::from).collect())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.client.clone().shutdown().await;
        tracing::info!("connection to MongoDB closed");
        Ok(())
    }
}
