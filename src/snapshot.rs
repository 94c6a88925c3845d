// MIT License - Copyright (c) 2026 Peter Wright
// Polled panel state

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::devices::zone::{aggregate, RawZone, ZoneRecord};
use crate::status::{normalize, AlarmState};

/// Immutable aggregate of one successful poll.
///
/// Held behind an `Arc` and swapped wholesale by the coordinator, so readers
/// never observe a partially updated value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub alarm_state: AlarmState,
    pub zones: Vec<ZoneRecord>,
    pub alarm_active: bool,
    pub anomaly_present: bool,
    pub taken_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from the raw status code and raw zone list of one poll.
    pub fn from_raw(raw_status: u8, raw_zones: &[RawZone]) -> Self {
        let agg = aggregate(raw_zones);
        Self {
            alarm_state: normalize(raw_status),
            zones: agg.zones,
            alarm_active: agg.alarm_active,
            anomaly_present: agg.anomaly_present,
            taken_at: Utc::now(),
        }
    }

    /// Zones currently carrying the ALARM tag.
    pub fn alarmed_zones(&self) -> Vec<ZoneRecord> {
        self.zones.iter().filter(|z| z.is_alarm()).cloned().collect()
    }

    pub fn zone(&self, id: u32) -> Option<&ZoneRecord> {
        self.zones.iter().find(|z| z.id == id)
    }

    /// Flat attribute map: `zone_{id}_name` for every zone, `zone_{id}_status`
    /// for zones with at least one known tag.
    pub fn zone_attributes(&self) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        for zone in &self.zones {
            attrs.insert(format!("zone_{}_name", zone.id), zone.name.clone());
            if !zone.status.is_empty() {
                attrs.insert(format!("zone_{}_status", zone.id), zone.status_label());
            }
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn test_triggered_with_alarm_zone() {
        let snap = Snapshot::from_raw(
            STATUS_TRIGGERED,
            &[
                RawZone::new(1, "Door", vec![ZONE_CODE_IN_USE]),
                RawZone::new(2, "Hall", vec![ZONE_CODE_IN_USE, ZONE_CODE_ALARM]),
            ],
        );
        assert_eq!(snap.alarm_state, AlarmState::Triggered);
        assert!(snap.alarm_active);
        assert!(!snap.anomaly_present);
        let alarmed: Vec<u32> = snap.alarmed_zones().iter().map(|z| z.id).collect();
        assert_eq!(alarmed, vec![2]);
    }

    #[test]
    fn test_zone_attributes() {
        let snap = Snapshot::from_raw(
            STATUS_DISARMED,
            &[
                RawZone::new(1, "Door", vec![ZONE_CODE_IN_USE, ZONE_CODE_BYPASS]),
                RawZone::new(3, "Attic", vec![42]),
            ],
        );
        let attrs = snap.zone_attributes();
        assert_eq!(attrs["zone_1_name"], "Door");
        assert_eq!(attrs["zone_1_status"], "ZONE_IN_USE, ZONE_BYPASS");
        assert_eq!(attrs["zone_3_name"], "Attic");
        assert!(!attrs.contains_key("zone_3_status"));
        assert_eq!(attrs.len(), 3);
    }

    #[test]
    fn test_zone_lookup() {
        let snap = Snapshot::from_raw(STATUS_ARMED_AWAY, &[RawZone::new(9, "Porch", vec![])]);
        assert_eq!(snap.zone(9).map(|z| z.name.as_str()), Some("Porch"));
        assert!(snap.zone(1).is_none());
    }
}
