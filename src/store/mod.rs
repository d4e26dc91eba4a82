//! Durable record of which scripts have been applied.
//!
//! One [`LogEntry`] exists per applied script name; no entry means the
//! script is not applied.

use chrono::{DateTime as ChronoDateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod memory;
pub mod mongo;

pub use memory::MemoryLogStore;
pub use mongo::MongoLogStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    Running,
    Complete,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Running => "RUNNING",
            LogStatus::Complete => "COMPLETE",
        }
    }
}

/// Field names match documents written by existing deployments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub status: LogStatus,
    pub script_content: String,
    /// Milliseconds the forward routine took.
    pub time_consuming: f64,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl LogEntry {
    pub fn complete(
        name: impl Into<String>,
        script_content: impl Into<String>,
        time_consuming: f64,
    ) -> Self {
        let now = DateTime::now();
        Self {
            id: None,
            name: name.into(),
            status: LogStatus::Complete,
            script_content: script_content.into(),
            time_consuming,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn created_at_utc(&self) -> ChronoDateTime<Utc> {
        ChronoDateTime::<Utc>::from_timestamp_millis(self.created_at.timestamp_millis())
            .unwrap_or_default()
    }
}

/// A persistent, name-indexed collection of log entries.
///
/// `Db` is the handle migration routines receive; it lives alongside the log
/// because scripts and their audit trail share one database.
#[async_trait::async_trait]
pub trait LogStore: Send + Sync {
    type Db: Send + Sync + 'static;

    async fn db(&self) -> Result<Self::Db>;

    /// All entries, ordered by identity ascending.
    async fn find_all(&self) -> Result<Vec<LogEntry>>;

    /// Does not check `name` uniqueness; callers insert at most once per name.
    async fn insert(&self, entry: LogEntry) -> Result<()>;

    /// Removing a name with no entry is not an error.
    async fn delete_by_name(&self, name: &str) -> Result<()>;

    async fn close(self) -> Result<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}
