//! Discovery of migration scripts on disk.
//!
//! Only files named `<YYYYMMDDHHmmss>_<label>.js` take part; anything else
//! in the directory is ignored. Scripts are ordered by their timestamp
//! prefix, oldest first.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::timestamp::ScriptTimestamp;

static SCRIPT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{14}_.*\.js$").expect("script name pattern is valid")
});

/// A migration script discovered on disk. Identity is `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    name: String,
    path: PathBuf,
    timestamp: ScriptTimestamp,
}

impl ScriptFile {
    /// Builds a script from a filename inside `dir`, or `None` if the name
    /// is not a migration script.
    pub fn from_filename(dir: &Path, filename: &str) -> Option<Self> {
        if !SCRIPT_NAME.is_match(filename) {
            return None;
        }
        let timestamp = ScriptTimestamp::from_filename(filename)?;
        Some(Self {
            name: filename.to_string(),
            path: dir.join(filename),
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PartialOrd for ScriptFile {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScriptFile {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Ordered view of every valid script in a directory.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scripts: Vec<ScriptFile>,
}

impl Catalog {
    /// Reads `dir` and keeps the entries that are migration scripts.
    ///
    /// `dir` must be absolute. No partial result is returned on I/O failure.
    pub async fn scan(dir: &Path) -> Result<Self> {
        if !dir.is_absolute() {
            return Err(Error::InvalidConfiguration(format!(
                "scriptsDir must be absolute path, got {}",
                dir.display()
            )));
        }

        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| Error::filesystem(dir, e))?;

        let mut scripts = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::filesystem(dir, e))?
        {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(script) = ScriptFile::from_filename(dir, file_name) else {
                debug!(file = %file_name, "ignoring non-migration file");
                continue;
            };
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Error::filesystem(entry.path(), e))?;
            if file_type.is_dir() {
                continue;
            }
            scripts.push(script);
        }

        Ok(Self::from_scripts(scripts))
    }

    fn from_scripts(mut scripts: Vec<ScriptFile>) -> Self {
        scripts.sort();
        for pair in scripts.windows(2) {
            if pair[0].timestamp == pair[1].timestamp {
                warn!(
                    first = %pair[0].name,
                    second = %pair[1].name,
                    "scripts share a timestamp prefix; ordering falls back to filename"
                );
            }
        }
        Self { scripts }
    }

    /// Oldest first, the order scripts are applied in.
    pub fn ascending(&self) -> impl DoubleEndedIterator<Item = &ScriptFile> {
        self.scripts.iter()
    }

    /// Newest first, the order rollback scans in.
    pub fn descending(&self) -> impl Iterator<Item = &ScriptFile> {
        self.scripts.iter().rev()
    }

    pub fn into_scripts(self) -> Vec<ScriptFile> {
        self.scripts
    }
}
