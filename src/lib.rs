//! Applies timestamp-ordered migration scripts to a MongoDB database and
//! keeps an audit log of what has been applied.
//!
//! Scripts are files named `<YYYYMMDDHHmmss>_<label>.js` in one directory.
//! A script is applied when its log entry exists; `up` applies every pending
//! script oldest first, `down` rolls back only the newest applied one.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod migrations;
pub mod status;
pub mod store;
pub mod telemetry;
pub mod timestamp;

pub use catalog::{Catalog, ScriptFile};
pub use config::MigrateConfig;
pub use error::{Error, Result};
pub use migrations::{Direction, LoadedScript, Migration, Migrator, Registry, ScriptLoader};
pub use status::ScriptLogView;
pub use store::{LogEntry, LogStatus, LogStore, MemoryLogStore, MongoLogStore};
pub use timestamp::ScriptTimestamp;
