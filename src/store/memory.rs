use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use mongodb::bson::oid::ObjectId;

use super::{LogEntry, LogStore};
use crate::error::{Error, Result};

/// Log store held in process memory.
///
/// Clones share the same entries, and the store is its own script handle, so
/// routines under test can observe the log as they run.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    offline: Arc<AtomicBool>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with a persistence error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Names of the logged scripts in insertion order.
    pub fn names(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.iter().map(|e| e.name.clone()).collect())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<LogEntry>>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Persistence("memory log store is offline".into()));
        }
        self.entries
            .lock()
            .map_err(|_| Error::Persistence("memory log store lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl LogStore for MemoryLogStore {
    type Db = MemoryLogStore;

    async fn db(&self) -> Result<Self::Db> {
        Ok(self.clone())
    }

    async fn find_all(&self) -> Result<Vec<LogEntry>> {
        Ok(self.lock()?.clone())
    }

    async fn insert(&self, mut entry: LogEntry) -> Result<()> {
        let mut entries = self.lock()?;
        entry.id.get_or_insert_with(ObjectId::new);
        entries.push(entry);
        Ok(())
    }

    async fn delete_by_name(&self, name: &str) -> Result<()> {
        let mut entries = self.lock()?;
        if let Some(pos) = entries.iter().position(|e| e.name == name) {
            entries.remove(pos);
        }
        Ok(())
    }
}
