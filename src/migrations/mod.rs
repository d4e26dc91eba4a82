// Migration units, how they are loaded, and the engine that applies them.
use std::fmt;
use std::sync::Arc;

use mongodb::Database;

use crate::catalog::ScriptFile;
use crate::error::Result;

pub mod registry;
pub mod runner;

pub use registry::Registry;
pub use runner::Migrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// A unit of forward/reverse work bound to one script file.
///
/// `D` is the store handle the routines run against. A unit that returns
/// `false` from [`Migration::provides`] is skipped for that direction.
#[async_trait::async_trait]
pub trait Migration<D = Database>: Send + Sync
where
    D: Send + Sync + 'static,
{
    fn provides(&self, _direction: Direction) -> bool {
        true
    }

    async fn up(&self, db: &D) -> anyhow::Result<()>;

    async fn down(&self, db: &D) -> anyhow::Result<()>;
}

/// A unit resolved for a script, with the source text captured for the log.
pub struct LoadedScript<D: Send + Sync + 'static> {
    pub migration: Arc<dyn Migration<D>>,
    pub source: String,
}

impl<D: Send + Sync + 'static> LoadedScript<D> {
    pub fn new(migration: Arc<dyn Migration<D>>, source: impl Into<String>) -> Self {
        Self {
            migration,
            source: source.into(),
        }
    }
}

/// Resolves a discovered script file to its executable unit.
#[async_trait::async_trait]
pub trait ScriptLoader<D: Send + Sync + 'static>: Send + Sync {
    async fn load(&self, script: &ScriptFile) -> Result<LoadedScript<D>>;
}
