use std::path::PathBuf;

use thiserror::Error;

use crate::migrations::Direction;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("filesystem error at {}: {}", .path.display(), .source)]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("failed to load script {name}: {reason}")]
    ScriptLoad { name: String, reason: String },

    #[error("script {name} failed during {direction}: {source}")]
    ScriptExecution {
        name: String,
        direction: Direction,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid script label: {0}")]
    InvalidLabel(String),
}

impl Error {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn script_execution(
        name: impl Into<String>,
        direction: Direction,
        source: anyhow::Error,
    ) -> Self {
        Error::ScriptExecution {
            name: name.into(),
            direction,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_display_includes_context() {
        let e = Error::InvalidConfiguration("scriptsDir must be absolute path".into());
        assert_eq!(
            e.to_string(),
            "invalid configuration: scriptsDir must be absolute path"
        );

        let e = Error::Persistence("connection refused".into());
        assert_eq!(e.to_string(), "persistence error: connection refused");

        let e = Error::ScriptLoad {
            name: "20240101000000_a.js".into(),
            reason: "not registered".into(),
        };
        assert_eq!(
            e.to_string(),
            "failed to load script 20240101000000_a.js: not registered"
        );
    }

    #[test]
    fn script_execution_keeps_original_error_as_source() {
        let e = Error::script_execution(
            "20240102000000_b.js",
            Direction::Up,
            anyhow::anyhow!("duplicate key"),
        );
        assert_eq!(
            e.to_string(),
            "script 20240102000000_b.js failed during up: duplicate key"
        );
        assert_eq!(e.source().map(|s| s.to_string()).as_deref(), Some("duplicate key"));
    }
}
