use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_STORE_URL: &str = "mongodb://localhost:27017";
pub const DEFAULT_COLLECTION: &str = "migrations";
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Settings the migrator is constructed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrateConfig {
    pub store_url: String,
    /// Falls back to the database named in `store_url`, then to `test`.
    #[serde(default)]
    pub database_name: Option<String>,
    /// Must be an absolute path.
    pub scripts_dir: PathBuf,
    #[serde(default = "default_collection")]
    pub collection_name: String,
    /// Scaffold used by `create`; the built-in template when unset.
    #[serde(default)]
    pub template_path: Option<PathBuf>,
    #[serde(default = "default_connect_timeout", with = "duration_ms")]
    pub connect_timeout: Duration,
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_connect_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
}

impl MigrateConfig {
    pub fn new(store_url: impl Into<String>, scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_url: store_url.into(),
            database_name: None,
            scripts_dir: scripts_dir.into(),
            collection_name: default_collection(),
            template_path: None,
            connect_timeout: default_connect_timeout(),
        }
    }

    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    /// Reads settings from the process environment, loading `.env` first.
    ///
    /// `MONGO_MIGRATE_SCRIPTS_DIR` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let scripts_dir = env::var("MONGO_MIGRATE_SCRIPTS_DIR").map_err(|_| {
            Error::InvalidConfiguration("MONGO_MIGRATE_SCRIPTS_DIR is not set".into())
        })?;
        let config = Self::from_env_with_scripts_dir(scripts_dir);
        config.validate()?;
        Ok(config)
    }

    /// Environment settings around an explicitly chosen scripts directory.
    /// The result is not validated.
    pub fn from_env_with_scripts_dir(scripts_dir: impl Into<PathBuf>) -> Self {
        let store_url = env::var("MONGO_MIGRATE_URL")
            .or_else(|_| env::var("MONGODB_URI"))
            .unwrap_or_else(|_| DEFAULT_STORE_URL.to_string());
        let connect_timeout = env::var("MONGODB_CONNECT_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS);

        Self {
            store_url,
            database_name: env::var("MONGO_MIGRATE_DB").ok().filter(|v| !v.is_empty()),
            scripts_dir: scripts_dir.into(),
            collection_name: env::var("MONGO_MIGRATE_COLLECTION")
                .unwrap_or_else(|_| default_collection()),
            template_path: env::var("MONGO_MIGRATE_TEMPLATE").ok().map(PathBuf::from),
            connect_timeout: Duration::from_millis(connect_timeout),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.require_absolute_scripts_dir()?;
        if self.collection_name.trim().is_empty() {
            return Err(Error::InvalidConfiguration(
                "collectionName must not be empty".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn require_absolute_scripts_dir(&self) -> Result<()> {
        if !self.scripts_dir.is_absolute() {
            return Err(Error::InvalidConfiguration(format!(
                "scriptsDir must be absolute path, got {}",
                self.scripts_dir.display()
            )));
        }
        Ok(())
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_scripts_dir_is_rejected() {
        let config = MigrateConfig::new(DEFAULT_STORE_URL, "migrations");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let dir = std::env::temp_dir();
        let config = MigrateConfig::new(DEFAULT_STORE_URL, dir).with_collection(" ");
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: MigrateConfig = serde_json::from_str(
            r#"{"storeUrl": "mongodb://db:27017/app", "scriptsDir": "/srv/migrations"}"#,
        )
        .unwrap();
        assert_eq!(config.store_url, "mongodb://db:27017/app");
        assert_eq!(config.scripts_dir, PathBuf::from("/srv/migrations"));
        assert_eq!(config.collection_name, DEFAULT_COLLECTION);
        assert_eq!(config.database_name, None);
        assert_eq!(config.connect_timeout, Duration::from_millis(10_000));
    }

    #[test]
    fn builder_overrides() {
        let config = MigrateConfig::new(DEFAULT_STORE_URL, "/srv/migrations")
            .with_database("app")
            .with_collection("schema_log")
            .with_template("/srv/template.js");
        assert_eq!(config.database_name.as_deref(), Some("app"));
        assert_eq!(config.collection_name, "schema_log");
        assert_eq!(config.template_path, Some(PathBuf::from("/srv/template.js")));
        assert!(config.validate().is_ok());
    }
}
