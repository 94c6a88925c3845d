// MIT License - Copyright (c) 2026 Peter Wright
// Coordinator events

use std::sync::Arc;

use serde_json::{json, Value};

use crate::constants::{
    EVENT_ARM_AWAY, EVENT_ARM_STAY, EVENT_CANCEL, EVENT_DISARM, EVENT_LOGS, EVENT_REFRESH_FAILED,
    EVENT_SNAPSHOT_UPDATED, EVENT_TRIGGERED,
};
use crate::devices::{RawLogEntry, ZoneRecord};
use crate::snapshot::Snapshot;

/// All events that can be emitted by a coordinator.
///
/// Users subscribe via `coordinator.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<PanelEvent>`.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    /// A poll succeeded and the cached snapshot was replaced
    SnapshotUpdated(Arc<Snapshot>),
    /// A poll failed; the previous snapshot is kept
    RefreshFailed { reason: String },
    /// The panel entered the triggered state
    Triggered { zones: Vec<ZoneRecord> },
    ArmedAway,
    ArmedHome,
    Disarmed,
    AlarmCancelled,
    /// A log query returned at least one entry
    LogsRetrieved { entries: Vec<RawLogEntry> },
}

impl PanelEvent {
    /// Stable event bus name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SnapshotUpdated(_) => EVENT_SNAPSHOT_UPDATED,
            Self::RefreshFailed { .. } => EVENT_REFRESH_FAILED,
            Self::Triggered { .. } => EVENT_TRIGGERED,
            Self::ArmedAway => EVENT_ARM_AWAY,
            Self::ArmedHome => EVENT_ARM_STAY,
            Self::Disarmed => EVENT_DISARM,
            Self::AlarmCancelled => EVENT_CANCEL,
            Self::LogsRetrieved { .. } => EVENT_LOGS,
        }
    }

    /// Status label carried by command confirmations.
    pub fn alarm_status(&self) -> Option<&'static str> {
        match self {
            Self::ArmedAway => Some("ARMED AWAY"),
            Self::ArmedHome => Some("ARMED HOME"),
            Self::Disarmed => Some("DISARMED"),
            Self::AlarmCancelled => Some("CANCELLED"),
            _ => None,
        }
    }

    pub fn is_command_confirmation(&self) -> bool {
        self.alarm_status().is_some()
    }

    /// Event data as published on the bus.
    pub fn payload(&self) -> Value {
        match self {
            Self::SnapshotUpdated(snap) => json!({
                "alarm_state": snap.alarm_state,
                "alarm_active": snap.alarm_active,
                "anomaly_present": snap.anomaly_present,
            }),
            Self::RefreshFailed { reason } => json!({ "reason": reason }),
            Self::Triggered { zones } => json!({ "zones": zones }),
            Self::LogsRetrieved { entries } => json!({ "entries": entries }),
            confirmation => json!({ "alarm_status": confirmation.alarm_status() }),
        }
    }
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<PanelEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<PanelEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_labels() {
        assert_eq!(PanelEvent::Disarmed.name(), "ialarm_disarm");
        assert_eq!(PanelEvent::ArmedHome.name(), "ialarm_arm_stay");
        assert_eq!(PanelEvent::ArmedAway.payload(), json!({"alarm_status": "ARMED AWAY"}));
        assert_eq!(PanelEvent::AlarmCancelled.alarm_status(), Some("CANCELLED"));
        assert!(!PanelEvent::RefreshFailed { reason: "x".into() }.is_command_confirmation());
    }

    #[test]
    fn test_refresh_failed_payload() {
        let event = PanelEvent::RefreshFailed { reason: "timeout".into() };
        assert_eq!(event.name(), "ialarm_refresh_failed");
        assert_eq!(event.payload(), json!({"reason": "timeout"}));
    }
}
