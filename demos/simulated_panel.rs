// MIT License - Copyright (c) 2026 Peter Wright
// In-process iAlarm panel for the demos

use std::sync::Mutex;

use chrono::Local;
use ialarm_bridge::constants::{
    STATUS_ARMED_AWAY, STATUS_ARMED_STAY, STATUS_DISARMED, STATUS_TRIGGERED, ZONE_CODE_ALARM,
    ZONE_CODE_IN_USE, ZONE_CODE_LOW_BATTERY,
};
use ialarm_bridge::{DeviceClient, IAlarmError, RawLogEntry, RawZone, Result};
use tracing::debug;

struct PanelState {
    status: u8,
    zones: Vec<RawZone>,
    log: Vec<RawLogEntry>,
}

/// Behaves like a small four-zone installation. Arm and disarm requests
/// change its status and append to its event log.
pub struct SimulatedPanel {
    host: String,
    mac: String,
    state: Mutex<PanelState>,
}

impl SimulatedPanel {
    pub fn new(host: &str) -> Self {
        // Derive a stable fake MAC from the host so several panels can coexist
        let seed = host.bytes().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        let mac = format!(
            "00:1A:{:02X}:{:02X}:{:02X}:{:02X}",
            (seed >> 24) as u8,
            (seed >> 16) as u8,
            (seed >> 8) as u8,
            seed as u8
        );
        Self {
            host: host.to_string(),
            mac,
            state: Mutex::new(PanelState {
                status: STATUS_DISARMED,
                zones: vec![
                    RawZone::new(1, "Front door", vec![ZONE_CODE_IN_USE]),
                    RawZone::new(2, "Hallway PIR", vec![ZONE_CODE_IN_USE]),
                    RawZone::new(3, "Garage", vec![ZONE_CODE_IN_USE, ZONE_CODE_LOW_BATTERY]),
                    RawZone::new(4, "Spare", vec![]),
                ],
                log: Vec::new(),
            }),
        }
    }

    /// Put a zone into alarm. An armed panel goes to triggered.
    pub fn trip_zone(&self, zone_id: u32) -> Result<()> {
        self.with_state(|state| {
            let name = match state.zones.iter_mut().find(|z| z.zone_id == Some(zone_id)) {
                Some(zone) => {
                    if !zone.types.contains(&ZONE_CODE_ALARM) {
                        zone.types.push(ZONE_CODE_ALARM);
                    }
                    zone.name.clone().unwrap_or_default()
                }
                None => return,
            };
            if state.status != STATUS_DISARMED {
                state.status = STATUS_TRIGGERED;
            }
            push_log(state, "Zone alarm", &name, Some(zone_id));
        })
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut PanelState) -> T) -> Result<T> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| IAlarmError::connection("simulated panel state poisoned"))?;
        Ok(f(&mut state))
    }

    fn set_status(&self, status: u8, event: &str) -> Result<()> {
        debug!("Simulated panel {} -> {}", self.host, event);
        self.with_state(|state| {
            state.status = status;
            push_log(state, event, "User 1", None);
        })
    }
}

fn push_log(state: &mut PanelState, event: &str, name: &str, zone: Option<u32>) {
    state.log.insert(
        0,
        RawLogEntry {
            time: Local::now().naive_local(),
            area: 1,
            event: event.to_string(),
            name: name.to_string(),
            zone,
        },
    );
}

impl DeviceClient for SimulatedPanel {
    fn host(&self) -> &str {
        &self.host
    }

    async fn get_mac(&self) -> Result<String> {
        Ok(self.mac.clone())
    }

    async fn get_status(&self) -> Result<u8> {
        self.with_state(|state| state.status)
    }

    async fn get_zone_status(&self) -> Result<Vec<RawZone>> {
        self.with_state(|state| state.zones.clone())
    }

    async fn arm_away(&self) -> Result<()> {
        self.set_status(STATUS_ARMED_AWAY, "Arm away")
    }

    async fn arm_stay(&self) -> Result<()> {
        self.set_status(STATUS_ARMED_STAY, "Arm stay")
    }

    async fn disarm(&self) -> Result<()> {
        self.set_status(STATUS_DISARMED, "Disarm")
    }

    async fn cancel_alarm(&self) -> Result<()> {
        self.with_state(|state| {
            for zone in &mut state.zones {
                zone.types.retain(|code| *code != ZONE_CODE_ALARM);
            }
            if state.status == STATUS_TRIGGERED {
                state.status = STATUS_DISARMED;
            }
            push_log(state, "Alarm cancelled", "User 1", None);
        })
    }

    async fn get_last_log_entries(&self, count: usize) -> Result<Vec<RawLogEntry>> {
        self.with_state(|state| state.log.iter().take(count).cloned().collect())
    }
}
