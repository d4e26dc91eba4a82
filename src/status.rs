use serde::Serialize;

use crate::store::LogEntry;
use crate::timestamp::format_created_at;

/// Display form of a log entry, as reported by `status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptLogView {
    /// Script name
    pub name: String,

    /// Script running status
    pub status: String,

    /// Captured script source
    pub script_content: String,

    /// Milliseconds to execute
    pub time_consuming: f64,

    /// `YYYY-MM-DD HH:mm:ss`, local time
    pub created_at: String,
}

impl From<&LogEntry> for ScriptLogView {
    fn from(entry: &LogEntry) -> Self {
        Self {
            name: entry.name.clone(),
            status: entry.status.as_str().to_string(),
            script_content: entry.script_content.clone(),
            time_consuming: entry.time_consuming,
            created_at: format_created_at(entry.created_at_utc()),
        }
    }
}

impl From<LogEntry> for ScriptLogView {
    fn from(entry: LogEntry) -> Self {
        Self::from(&entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use mongodb::bson::DateTime;

    #[test]
    fn projects_entry_fields() {
        let mut entry = LogEntry::complete("20240101000000_a.js", "async up(db) {}", 15.25);
        let local = Local.with_ymd_and_hms(2024, 1, 1, 8, 30, 5).unwrap();
        entry.created_at = DateTime::from_millis(local.timestamp_millis());

        let view = ScriptLogView::from(&entry);
        assert_eq!(view.name, "20240101000000_a.js");
        assert_eq!(view.status, "COMPLETE");
        assert_eq!(view.script_content, "async up(db) {}");
        assert_eq!(view.time_consuming, 15.25);
        assert_eq!(view.created_at, "2024-01-01 08:30:05");
    }

    #[test]
    fn serializes_camel_case() {
        let view = ScriptLogView::from(LogEntry::complete("20240101000000_a.js", "", 1.0));
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("scriptContent").is_some());
        assert!(json.get("timeConsuming").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
