use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

use super::Configurator;

const DEFAULT_ENVIRONMENT: &str = "local";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_DATABASE: &str = "manage-me";

#[derive(Debug, Clone)]
pub struct EnvConfigurator {
    environment: String,
    host: String,
    port: u16,
    mongodb_uri: Option<String>,
    mongodb_database: String,
}

impl EnvConfigurator {
    /// Reads the process environment, layered over `.env.<APP_ENV>` in the
    /// working directory when that file exists.
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = std::env::var("APP_ENV")
            .ok()
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        Self::from_env_file(format!(".env.{}", environment), |key| {
            std::env::var(key).ok()
        })
    }

    /// Variables returned by `lookup` win over entries in `path`, matching
    /// `dotenvy`'s refusal to override what is already set.
    pub(crate) fn from_env_file<P, F>(path: P, lookup: F) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let file: HashMap<String, String> = match dotenvy::from_path_iter(path) {
            Ok(entries) => entries
                .collect::<Result<_, _>>()
                .with_context(|| format!("could not parse {}", path.display()))?,
            Err(error) if error.not_found() => {
                tracing::warn!(
                    path = %path.display(),
                    "no env file found, using system environment variables"
                );
                HashMap::new()
            }
            Err(error) => {
                return Err(error).with_context(|| format!("could not read {}", path.display()))
            }
        };

        Self::from_lookup(|key| lookup(key).or_else(|| file.get(key).cloned()))
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let environment =
            non_empty("APP_ENV").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        let host = non_empty("SERVER_HOST")
            .or_else(|| non_empty("HOST"))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_empty("SERVER_PORT").or_else(|| non_empty("PORT")) {
            Some(port) => port
                .parse::<u16>()
                .with_context(|| format!("invalid server port {:?}", port))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment,
            host,
            port,
            mongodb_uri: non_empty("MONGODB_URI"),
            mongodb_database: non_empty("MONGODB_DATABASE")
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }
}

impl Configurator for EnvConfigurator {
    fn environment(&self) -> &str {
        &self.environment
    }

    fn bind_address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }

    fn mongodb_uri(&self) -> Option<&str> {
        self.mongodb_uri.as_deref()
    }

    fn mongodb_database(&self) -> &str {
        &self.mongodb_database
    }
}
