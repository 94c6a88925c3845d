// Scripted in-memory panel used by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use ialarm_bridge::{
    DeviceClient, IAlarmError, PanelConfig, RawLogEntry, RawZone, Result, StatusReport,
};

#[derive(Default)]
struct FakeState {
    mac: Mutex<Option<String>>,
    status: Mutex<u8>,
    zones: Mutex<Vec<RawZone>>,
    logs: Mutex<Vec<RawLogEntry>>,
    classified_alarms: Mutex<Option<Vec<RawZone>>>,
    fail_polls: AtomicBool,
    fail_commands: AtomicBool,
    hang_mac: AtomicBool,
    hang_polls: AtomicBool,
    ignore_log_count: AtomicBool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

/// Cloning shares the script, so a test can keep a handle after moving the
/// client into a coordinator.
#[derive(Clone)]
pub struct FakeClient {
    host: String,
    state: Arc<FakeState>,
}

impl FakeClient {
    pub fn new(mac: &str) -> Self {
        let client = Self {
            host: "10.0.0.2".to_string(),
            state: Arc::new(FakeState::default()),
        };
        *client.state.mac.lock().unwrap() = Some(mac.to_string());
        *client.state.status.lock().unwrap() = 1;
        client
    }

    /// A panel that never answers the identity request.
    pub fn unreachable() -> Self {
        let client = Self::new("");
        *client.state.mac.lock().unwrap() = None;
        client
    }

    pub fn set_status(&self, status: u8) {
        *self.state.status.lock().unwrap() = status;
    }

    pub fn set_zones(&self, zones: Vec<RawZone>) {
        *self.state.zones.lock().unwrap() = zones;
    }

    pub fn set_logs(&self, logs: Vec<RawLogEntry>) {
        *self.state.logs.lock().unwrap() = logs;
    }

    pub fn fail_polls(&self, fail: bool) {
        self.state.fail_polls.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commands(&self, fail: bool) {
        self.state.fail_commands.store(fail, Ordering::SeqCst);
    }

    pub fn hang_mac(&self) {
        self.state.hang_mac.store(true, Ordering::SeqCst);
    }

    /// Alarmed zones reported by the status read, independent of zone tags.
    pub fn classify_alarms(&self, zones: Vec<RawZone>) {
        *self.state.classified_alarms.lock().unwrap() = Some(zones);
    }

    pub fn hang_polls(&self) {
        self.state.hang_polls.store(true, Ordering::SeqCst);
    }

    /// Return the whole log whatever count is requested.
    pub fn ignore_log_count(&self) {
        self.state.ignore_log_count.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.state.calls.lock().unwrap().entry(method).or_insert(0) += 1;
    }

    fn poll_result<T>(&self, value: impl FnOnce() -> T) -> Result<T> {
        if self.state.fail_polls.load(Ordering::SeqCst) {
            Err(IAlarmError::connection("connection reset by peer"))
        } else {
            Ok(value())
        }
    }

    fn command_result(&self) -> Result<()> {
        if self.state.fail_commands.load(Ordering::SeqCst) {
            Err(IAlarmError::connection("connection refused"))
        } else {
            Ok(())
        }
    }
}

impl DeviceClient for FakeClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn get_mac(&self) -> Result<String> {
        self.record("get_mac");
        if self.state.hang_mac.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mac = self.state.mac.lock().unwrap().clone();
        mac.ok_or_else(|| IAlarmError::connection("no route to host"))
    }

    async fn get_status(&self) -> Result<u8> {
        self.record("get_status");
        self.poll_result(|| *self.state.status.lock().unwrap())
    }

    async fn get_status_with_zones(&self, zones: &[RawZone]) -> Result<StatusReport> {
        self.record("get_status_with_zones");
        let status_value = self.get_status().await?;
        let classified = self.state.classified_alarms.lock().unwrap().clone();
        let alarmed_zones = classified
            .unwrap_or_else(|| zones.iter().filter(|z| z.has_alarm_code()).cloned().collect());
        Ok(StatusReport {
            status_value,
            alarmed_zones,
        })
    }

    async fn get_zone_status(&self) -> Result<Vec<RawZone>> {
        self.record("get_zone_status");
        if self.state.hang_polls.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.poll_result(|| self.state.zones.lock().unwrap().clone())
    }

    async fn arm_away(&self) -> Result<()> {
        self.record("arm_away");
        self.command_result()
    }

    async fn arm_stay(&self) -> Result<()> {
        self.record("arm_stay");
        self.command_result()
    }

    async fn disarm(&self) -> Result<()> {
        self.record("disarm");
        self.command_result()
    }

    async fn cancel_alarm(&self) -> Result<()> {
        self.record("cancel_alarm");
        self.command_result()
    }

    async fn get_last_log_entries(&self, count: usize) -> Result<Vec<RawLogEntry>> {
        self.record("get_last_log_entries");
        self.command_result()?;
        let count = if self.state.ignore_log_count.load(Ordering::SeqCst) {
            usize::MAX
        } else {
            count
        };
        Ok(self.state.logs.lock().unwrap().iter().take(count).cloned().collect())
    }

    async fn close(&self) -> Result<()> {
        self.record("close");
        Ok(())
    }
}

pub fn log_entry(minute: u32, event: &str, name: &str) -> RawLogEntry {
    RawLogEntry {
        time: NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(21, minute, 0)
            .unwrap(),
        area: 1,
        event: event.to_string(),
        name: name.to_string(),
        zone: None,
    }
}

pub fn test_config() -> PanelConfig {
    PanelConfig::builder().host("10.0.0.2").build()
}
