use std::fmt::Debug;

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::ApiError;
use crate::extractors::Validate;

/// A registration payload as submitted by a client.
///
/// Absent and `null` fields decode as empty strings so that they are
/// reported by [`Validate::validate`] instead of failing deserialization.
#[derive(Deserialize, Serialize, Clone, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct NewUser {
    #[serde(deserialize_with = "null_as_empty")]
    #[schemars(with = "Option<String>")]
    pub first_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[schemars(with = "Option<String>")]
    pub last_name: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[schemars(with = "Option<String>")]
    pub email: String,
    #[serde(deserialize_with = "null_as_empty")]
    #[schemars(with = "Option<String>")]
    pub password: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ApiError> {
        if self.email.is_empty()
            || self.password.is_empty()
            || self.first_name.is_empty()
            || self.last_name.is_empty()
        {
            return Err(ApiError::MissingRequiredFields);
        }

        Ok(())
    }
}

/// A [`NewUser`] after persistence. The shape of `Id` depends on the backing
/// store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct StoredUser<Id> {
    pub id: Id,
    #[serde(flatten)]
    pub user: NewUser,
}

impl<Id> StoredUser<Id> {
    pub fn new(id: Id, user: NewUser) -> Self {
        Self { id, user }
    }
}
