// MIT License - Copyright (c) 2026 Peter Wright
// Alarm status normalization

use std::fmt;

use serde::Serialize;

use crate::constants::{STATUS_ARMED_AWAY, STATUS_ARMED_STAY, STATUS_DISARMED, STATUS_TRIGGERED};

/// Domain alarm state derived from the panel's raw status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    ArmedAway,
    ArmedHome,
    Disarmed,
    Triggered,
    Unknown,
}

const STATUS_TABLE: [(u8, AlarmState); 4] = [
    (STATUS_ARMED_AWAY, AlarmState::ArmedAway),
    (STATUS_ARMED_STAY, AlarmState::ArmedHome),
    (STATUS_DISARMED, AlarmState::Disarmed),
    (STATUS_TRIGGERED, AlarmState::Triggered),
];

impl AlarmState {
    /// Map a raw status code. Codes outside the table (including CANCEL) are `Unknown`.
    pub fn from_code(code: u8) -> Self {
        STATUS_TABLE
            .iter()
            .find(|(c, _)| *c == code)
            .map_or(Self::Unknown, |(_, state)| *state)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmedAway => "armed_away",
            Self::ArmedHome => "armed_home",
            Self::Disarmed => "disarmed",
            Self::Triggered => "triggered",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered)
    }
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a raw status code into an [`AlarmState`].
pub fn normalize(raw_status: u8) -> AlarmState {
    AlarmState::from_code(raw_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::STATUS_CANCEL;

    #[test]
    fn test_known_codes() {
        assert_eq!(normalize(STATUS_ARMED_AWAY), AlarmState::ArmedAway);
        assert_eq!(normalize(STATUS_ARMED_STAY), AlarmState::ArmedHome);
        assert_eq!(normalize(STATUS_DISARMED), AlarmState::Disarmed);
        assert_eq!(normalize(STATUS_TRIGGERED), AlarmState::Triggered);
    }

    #[test]
    fn test_unmapped_codes_are_unknown() {
        assert_eq!(normalize(STATUS_CANCEL), AlarmState::Unknown);
        for code in 5..=u8::MAX {
            assert_eq!(normalize(code), AlarmState::Unknown, "code {code}");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(AlarmState::ArmedHome.to_string(), "armed_home");
        assert_eq!(
            serde_json::to_value(AlarmState::Triggered).unwrap(),
            serde_json::json!("triggered")
        );
    }
}
