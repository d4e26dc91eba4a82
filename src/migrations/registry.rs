use std::collections::HashMap;
use std::sync::Arc;

use mongodb::Database;

use super::{LoadedScript, Migration, ScriptLoader};
use crate::catalog::ScriptFile;
use crate::error::{Error, Result};

/// In-process loader mapping script filenames to compiled units.
///
/// The file on disk decides whether and when a script runs; the registry
/// supplies what it does. The file's text is captured as the log source.
///
/// ```rust,ignore
/// let registry = Registry::new()
///     .register("20240101000000_create_users.js", CreateUsers)
///     .register("20240102000000_add_email_index.js", AddEmailIndex);
/// ```
pub struct Registry<D: Send + Sync + 'static = Database> {
    units: HashMap<String, Arc<dyn Migration<D>>>,
}

impl<D: Send + Sync + 'static> Registry<D> {
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
        }
    }

    pub fn register<M>(mut self, name: impl Into<String>, migration: M) -> Self
    where
        M: Migration<D> + 'static,
    {
        self.units.insert(name.into(), Arc::new(migration));
        self
    }
}

impl<D: Send + Sync + 'static> Default for Registry<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<D: Send + Sync + 'static> ScriptLoader<D> for Registry<D> {
    async fn load(&self, script: &ScriptFile) -> Result<LoadedScript<D>> {
        let migration = self
            .units
            .get(script.name())
            .cloned()
            .ok_or_else(|| Error::ScriptLoad {
                name: script.name().to_string(),
                reason: "no migration registered under this name".into(),
            })?;
        let source = tokio::fs::read_to_string(script.path())
            .await
            .map_err(|e| Error::ScriptLoad {
                name: script.name().to_string(),
                reason: format!("failed to read {}: {e}", script.path().display()),
            })?;
        Ok(LoadedScript::new(migration, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::Direction;
    use tempfile::TempDir;

    struct Noop;

    #[async_trait::async_trait]
    impl Migration<()> for Noop {
        async fn up(&self, _db: &()) -> anyhow::Result<()> {
            Ok(())
        }

        async fn down(&self, _db: &()) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn load_captures_file_text() {
        let tmp = TempDir::new().unwrap();
        let body = "exports.up = async (db) => db.createCollection('users');\n";
        std::fs::write(tmp.path().join("20240101000000_users.js"), body).unwrap();
        let script = ScriptFile::from_filename(tmp.path(), "20240101000000_users.js").unwrap();

        let registry = Registry::<()>::new().register("20240101000000_users.js", Noop);
        let loaded = registry.load(&script).await.unwrap();
        assert_eq!(loaded.source, body);
        assert!(loaded.migration.provides(Direction::Up));
    }

    #[tokio::test]
    async fn unregistered_script_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("20240101000000_users.js"), "").unwrap();
        let script = ScriptFile::from_filename(tmp.path(), "20240101000000_users.js").unwrap();

        let registry = Registry::<()>::new();
        let err = registry.load(&script).await.err().unwrap();
        assert!(matches!(
            err,
            Error::ScriptLoad { ref name, .. } if name == "20240101000000_users.js"
        ));
    }

    #[tokio::test]
    async fn unreadable_file_is_a_load_error() {
        let tmp = TempDir::new().unwrap();
        let script = ScriptFile::from_filename(tmp.path(), "20240101000000_gone.js").unwrap();

        let registry = Registry::<()>::new().register("20240101000000_gone.js", Noop);
        let err = registry.load(&script).await.err().unwrap();
        assert!(matches!(err, Error::ScriptLoad { .. }));
    }
}
