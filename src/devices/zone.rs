// MIT License - Copyright (c) 2026 Peter Wright
// Zone status parsing and aggregation

use bitflags::bitflags;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::constants::{
    ZONE_CODE_ALARM, ZONE_CODE_BYPASS, ZONE_CODE_FAULT, ZONE_CODE_IN_USE, ZONE_CODE_LOSS,
    ZONE_CODE_LOW_BATTERY, ZONE_CODE_NOT_USED,
};

bitflags! {
    /// Zone status tags reported by the panel.
    ///
    /// The panel reports each tag as a separate numeric code; unknown codes
    /// are dropped when parsing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ZoneStatusFlags: u8 {
        /// Zone not configured
        const NOT_USED    = 0b0000_0001;
        /// Zone configured and active
        const IN_USE      = 0b0000_0010;
        /// Zone in alarm
        const ALARM       = 0b0000_0100;
        /// Zone bypassed
        const BYPASS      = 0b0000_1000;
        /// Sensor fault
        const FAULT       = 0b0001_0000;
        /// Sensor battery low
        const LOW_BATTERY = 0b0010_0000;
        /// Sensor lost (supervision)
        const LOSS        = 0b0100_0000;
    }
}

/// Vendor code, flag and presentation label, in label order.
const ZONE_STATUS_CODES: [(u32, ZoneStatusFlags, &str); 7] = [
    (ZONE_CODE_NOT_USED, ZoneStatusFlags::NOT_USED, "ZONE_NOT_USED"),
    (ZONE_CODE_IN_USE, ZoneStatusFlags::IN_USE, "ZONE_IN_USE"),
    (ZONE_CODE_ALARM, ZoneStatusFlags::ALARM, "ZONE_ALARM"),
    (ZONE_CODE_BYPASS, ZoneStatusFlags::BYPASS, "ZONE_BYPASS"),
    (ZONE_CODE_FAULT, ZoneStatusFlags::FAULT, "ZONE_FAULT"),
    (ZONE_CODE_LOW_BATTERY, ZoneStatusFlags::LOW_BATTERY, "ZONE_LOW_BATTERY"),
    (ZONE_CODE_LOSS, ZoneStatusFlags::LOSS, "ZONE_LOSS"),
];

impl ZoneStatusFlags {
    /// Tags that do not count as an anomaly.
    pub const NORMAL: Self = Self::NOT_USED.union(Self::IN_USE).union(Self::ALARM);

    /// Parse a list of raw vendor codes, ignoring codes that are not known tags.
    pub fn from_codes(codes: &[u32]) -> Self {
        let mut flags = Self::empty();
        for code in codes {
            if let Some((_, flag, _)) = ZONE_STATUS_CODES.iter().find(|(c, _, _)| c == code) {
                flags |= *flag;
            }
        }
        flags
    }

    /// Presentation labels of the set tags, in canonical order.
    pub fn labels(&self) -> Vec<&'static str> {
        ZONE_STATUS_CODES
            .iter()
            .filter(|(_, flag, _)| self.contains(*flag))
            .map(|(_, _, label)| *label)
            .collect()
    }

    /// Comma-joined labels, e.g. `"ZONE_IN_USE, ZONE_ALARM"`.
    pub fn label(&self) -> String {
        self.labels().join(", ")
    }

    /// Whether any tag outside NOT_USED / IN_USE / ALARM is set.
    pub fn is_anomalous(&self) -> bool {
        !self.difference(Self::NORMAL).is_empty()
    }
}

/// A zone record as reported by the device client, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawZone {
    pub zone_id: Option<u32>,
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<u32>,
}

impl RawZone {
    pub fn new(zone_id: u32, name: impl Into<String>, types: Vec<u32>) -> Self {
        Self {
            zone_id: Some(zone_id),
            name: Some(name.into()),
            types,
        }
    }

    pub fn has_alarm_code(&self) -> bool {
        self.types.contains(&ZONE_CODE_ALARM)
    }
}

/// A validated zone, immutable and replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneRecord {
    pub id: u32,
    pub name: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: ZoneStatusFlags,
}

fn serialize_status<S: Serializer>(status: &ZoneStatusFlags, s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(status.labels())
}

impl ZoneRecord {
    /// Validate a raw record. Records without an id or a name are rejected.
    pub fn from_raw(raw: &RawZone) -> Option<Self> {
        let id = raw.zone_id.filter(|id| *id != 0)?;
        let name = raw.name.as_deref().filter(|n| !n.is_empty())?;
        Some(Self {
            id,
            name: name.to_string(),
            status: ZoneStatusFlags::from_codes(&raw.types),
        })
    }

    pub fn is_alarm(&self) -> bool {
        self.status.contains(ZoneStatusFlags::ALARM)
    }

    pub fn is_bypassed(&self) -> bool {
        self.status.contains(ZoneStatusFlags::BYPASS)
    }

    pub fn is_fault(&self) -> bool {
        self.status.contains(ZoneStatusFlags::FAULT)
    }

    pub fn is_low_battery(&self) -> bool {
        self.status.contains(ZoneStatusFlags::LOW_BATTERY)
    }

    pub fn is_lost(&self) -> bool {
        self.status.contains(ZoneStatusFlags::LOSS)
    }

    pub fn is_not_used(&self) -> bool {
        self.status.contains(ZoneStatusFlags::NOT_USED)
    }

    pub fn is_anomalous(&self) -> bool {
        self.status.is_anomalous()
    }

    pub fn status_label(&self) -> String {
        self.status.label()
    }
}

/// Zone-derived part of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneAggregate {
    pub zones: Vec<ZoneRecord>,
    pub alarm_active: bool,
    pub anomaly_present: bool,
}

/// Reduce a raw zone list in one pass, preserving input order.
pub fn aggregate(raw_zones: &[RawZone]) -> ZoneAggregate {
    let mut out = ZoneAggregate {
        zones: Vec::with_capacity(raw_zones.len()),
        ..Default::default()
    };

    for raw in raw_zones {
        let Some(zone) = ZoneRecord::from_raw(raw) else {
            debug!(
                "Dropping incomplete zone record: id={:?} name={:?} types={:?}",
                raw.zone_id, raw.name, raw.types
            );
            continue;
        };
        debug!(
            "Zone ID: {}, Name: {}, Status Types: {}",
            zone.id,
            zone.name,
            zone.status_label()
        );
        out.alarm_active |= zone.is_alarm();
        out.anomaly_present |= zone.is_anomalous();
        out.zones.push(zone);
    }

    out
}
