//! The 14-digit `YYYYMMDDHHmmss` prefix that orders migration scripts, and
//! the display format used when reporting log entries.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, Timelike, Utc};

const PREFIX_FORMAT: &str = "%Y%m%d%H%M%S";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Number of digits in a script's timestamp prefix.
pub const PREFIX_LEN: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScriptTimestamp(NaiveDateTime);

impl ScriptTimestamp {
    /// Current local wall-clock time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_datetime(Local::now().naive_local())
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        // Second resolution: a generated timestamp equals its parsed form.
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    /// Parses the leading 14 digits of a script filename. Returns `None`
    /// when the prefix is missing or does not name a real calendar instant.
    pub fn from_filename(filename: &str) -> Option<Self> {
        filename.get(..PREFIX_LEN).and_then(|prefix| prefix.parse().ok())
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimestampError(String);

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid script timestamp {:?}", self.0)
    }
}

impl std::error::Error for ParseTimestampError {}

impl FromStr for ScriptTimestamp {
    type Err = ParseTimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != PREFIX_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseTimestampError(s.to_string()));
        }
        NaiveDateTime::parse_from_str(s, PREFIX_FORMAT)
            .map(Self)
            .map_err(|_| ParseTimestampError(s.to_string()))
    }
}

impl fmt::Display for ScriptTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(PREFIX_FORMAT))
    }
}

/// Renders a log entry timestamp as `YYYY-MM-DD HH:mm:ss` in local time.
pub fn format_created_at(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn parses_fourteen_digit_prefix() {
        let ts: ScriptTimestamp = "20250104123045".parse().unwrap();
        let dt = ts.datetime();
        assert_eq!(dt.year(), 2025);
        assert_eq!(dt.month(), 1);
        assert_eq!(dt.day(), 4);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 30);
        assert_eq!(dt.second(), 45);
        assert_eq!(ts.to_string(), "20250104123045");
    }

    #[test]
    fn rejects_malformed_prefixes() {
        assert!("2025010412304".parse::<ScriptTimestamp>().is_err());
        assert!("202501041230451".parse::<ScriptTimestamp>().is_err());
        assert!("2025010412304a".parse::<ScriptTimestamp>().is_err());
        assert!("20251341123045".parse::<ScriptTimestamp>().is_err());
        assert!("20250230000000".parse::<ScriptTimestamp>().is_err());
    }

    #[test]
    fn reads_prefix_from_filename() {
        let ts = ScriptTimestamp::from_filename("20240102000000_b.js").unwrap();
        assert_eq!(ts.to_string(), "20240102000000");
        assert!(ScriptTimestamp::from_filename("abc_foo.js").is_none());
        assert!(ScriptTimestamp::from_filename("2024").is_none());
    }

    #[test]
    fn orders_chronologically() {
        let a: ScriptTimestamp = "20231231235959".parse().unwrap();
        let b: ScriptTimestamp = "20240101000000".parse().unwrap();
        assert!(a < b);
    }

    #[test]
    fn now_round_trips_through_display() {
        let now = ScriptTimestamp::now();
        let rendered = now.to_string();
        assert_eq!(rendered.len(), PREFIX_LEN);
        assert_eq!(rendered.parse::<ScriptTimestamp>().unwrap(), now);
    }

    #[test]
    fn from_datetime_drops_subseconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_milli_opt(7, 8, 9, 750)
            .unwrap();
        assert_eq!(ScriptTimestamp::from_datetime(dt).to_string(), "20240506070809");
    }

    #[test]
    fn created_at_uses_display_layout() {
        let rendered = format_created_at(Utc::now());
        let re = regex::Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}$").unwrap();
        assert!(re.is_match(&rendered), "unexpected layout: {rendered}");
    }
}
