// MIT License - Copyright (c) 2026 Peter Wright
// Panel event log records

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A log record as returned by the device client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogEntry {
    /// Panel-local time of the event
    pub time: NaiveDateTime,
    pub area: u32,
    pub event: String,
    pub name: String,
    /// Zone number, when the event concerns a zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<u32>,
}

/// Normalized log entry handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub time: NaiveDateTime,
    pub area: u32,
    pub event: String,
    pub name: String,
}

impl From<&RawLogEntry> for LogEntry {
    fn from(raw: &RawLogEntry) -> Self {
        Self {
            time: raw.time,
            area: raw.area,
            event: raw.event.clone(),
            name: raw.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_projection_drops_zone() {
        let raw = RawLogEntry {
            time: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap().and_hms_opt(21, 4, 0).unwrap(),
            area: 1,
            event: "Zone alarm".into(),
            name: "Hall".into(),
            zone: Some(2),
        };
        let entry = LogEntry::from(&raw);
        assert_eq!(entry.area, 1);
        assert_eq!(entry.event, "Zone alarm");
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({
                "time": "2026-09-01T21:04:00",
                "area": 1,
                "event": "Zone alarm",
                "name": "Hall"
            })
        );
    }
}
