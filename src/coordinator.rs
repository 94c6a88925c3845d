// MIT License - Copyright (c) 2026 Peter Wright
// Polling coordinator for one iAlarm panel

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::client::DeviceClient;
use crate::config::PanelConfig;
use crate::devices::{LogEntry, RawZone, ZoneRecord};
use crate::error::{IAlarmError, Result};
use crate::event::{event_channel, EventReceiver, EventSender, PanelEvent};
use crate::snapshot::Snapshot;

/// Where the coordinator is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Failed,
}

/// Owns the cached state of one panel and every request made to it.
///
/// The client sits behind an async mutex: a poll holds it across both status
/// reads and each command holds it for its whole (possibly compound)
/// operation, so at most one request is on the wire at a time.
///
/// # Example
///
/// ```no_run
/// # async fn demo<C: ialarm_bridge::DeviceClient>(client: C) -> ialarm_bridge::Result<()> {
/// use ialarm_bridge::{PanelConfig, PanelCoordinator};
///
/// let config = PanelConfig::builder().host("192.168.1.81").build();
/// let coordinator = PanelCoordinator::setup(client, config).await?;
/// coordinator.start().await;
///
/// let mut events = coordinator.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{}: {}", event.name(), event.payload());
///     }
/// });
///
/// coordinator.arm_home().await?;
/// coordinator.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct PanelCoordinator<C: DeviceClient> {
    client: Mutex<C>,
    config: PanelConfig,
    host: String,
    mac: String,
    event_tx: EventSender,
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    poll_state: RwLock<PollState>,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    released: AtomicBool,
}

impl<C: DeviceClient> PanelCoordinator<C> {
    /// Bind a coordinator to an already identified client. No I/O is done.
    pub fn new(client: C, config: PanelConfig, mac: impl Into<String>) -> Self {
        let (event_tx, _event_rx) = event_channel(256);
        let (snapshot_tx, _snapshot_rx) = watch::channel(None);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);
        Self {
            host: client.host().to_string(),
            client: Mutex::new(client),
            config,
            mac: mac.into(),
            event_tx,
            snapshot_tx,
            poll_state: RwLock::new(PollState::Idle),
            shutdown_tx,
            loop_handle: Mutex::new(None),
            released: AtomicBool::new(false),
        }
    }

    /// Resolve the panel identity and run the first refresh, both bounded by
    /// the setup timeout.
    ///
    /// Any failure is reported as [`IAlarmError::NotReady`] and the client is
    /// closed before returning, whether or not the coordinator was built.
    pub async fn setup(client: C, config: PanelConfig) -> Result<Arc<Self>> {
        let host = client.host().to_string();
        info!("Setting up iAlarm panel at {}:{}", host, config.port);

        if let Err(e) = config.validate() {
            close_client(&client, &host).await;
            return Err(e);
        }

        let mac = match with_timeout(config.setup_timeout, "get_mac", client.get_mac()).await {
            Ok(mac) => mac,
            Err(e) => {
                warn!("Cannot resolve identity of panel {}: {}", host, e);
                close_client(&client, &host).await;
                return Err(not_ready(host, e));
            }
        };
        debug!("Panel {} identified as {}", host, mac);

        let coordinator = Arc::new(Self::new(client, config, mac));
        if let Err(e) = coordinator.first_refresh().await {
            warn!("First refresh of panel {} failed: {}", host, e);
            coordinator.release().await;
            return Err(not_ready(host, e));
        }

        info!("Panel {} ({}) ready", coordinator.host, coordinator.mac);
        Ok(coordinator)
    }

    /// Refresh once, failing fast when the panel does not answer in time.
    pub async fn first_refresh(&self) -> Result<Arc<Snapshot>> {
        let result = with_timeout(self.config.setup_timeout, "first refresh", self.refresh()).await;
        if result.is_err() {
            self.set_poll_state(PollState::Failed).await;
        }
        result
    }

    /// Start the periodic refresh loop. Calling it again is a no-op.
    ///
    /// The loop holds only a weak reference, so dropping the last handle to
    /// the coordinator also ends it.
    pub async fn start(self: &Arc<Self>) {
        let mut handle = self.loop_handle.lock().await;
        if handle.is_some() || *self.shutdown_tx.borrow() {
            return;
        }
        if self.config.scan_interval.is_zero() {
            warn!("Not polling {}: scan interval is zero", self.host);
            return;
        }
        debug!(
            "Starting poll loop for {} every {:?}",
            self.host, self.config.scan_interval
        );
        *handle = Some(tokio::spawn(poll_loop(
            Arc::downgrade(self),
            self.config.scan_interval,
            self.shutdown_tx.subscribe(),
        )));
    }

    /// Subscribe to coordinator events.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    /// Watch the cached snapshot; the receiver is notified on every replacement.
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_tx.subscribe()
    }

    // --- Accessors ---

    /// Latest snapshot, or `None` before the first successful poll.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    pub async fn poll_state(&self) -> PollState {
        *self.poll_state.read().await
    }

    pub fn mac(&self) -> &str {
        &self.mac
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    // --- Polling ---

    /// Fetch zone status, then alarm status, and swap in the new snapshot.
    ///
    /// On failure the cached snapshot is kept and `RefreshFailed` is emitted.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>> {
        self.ensure_open()?;
        self.set_poll_state(PollState::Polling).await;

        let fetched = {
            let client = self.client.lock().await;
            fetch_status(&*client).await
        };

        match fetched {
            Ok(polled) => {
                let snapshot = Arc::new(Snapshot::from_raw(polled.status, &polled.zones));
                let previous = self.snapshot_tx.send_replace(Some(snapshot.clone()));
                self.set_poll_state(PollState::Idle).await;
                debug!(
                    "Panel {} polled: state={} zones={} alarm={} anomaly={}",
                    self.host,
                    snapshot.alarm_state,
                    snapshot.zones.len(),
                    snapshot.alarm_active,
                    snapshot.anomaly_present
                );
                self.evaluate_transition(previous.as_deref(), &snapshot, polled.alarmed_zones);
                Ok(snapshot)
            }
            Err(e) => {
                warn!("Refresh of panel {} failed: {}", self.host, e);
                self.set_poll_state(PollState::Failed).await;
                self.emit(PanelEvent::RefreshFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// `alarmed_zones` is the panel's own classification from the status read,
    /// which may name zones whose raw tags lack ALARM.
    fn evaluate_transition(
        &self,
        previous: Option<&Snapshot>,
        current: &Arc<Snapshot>,
        alarmed_zones: Vec<ZoneRecord>,
    ) {
        let was_triggered = previous.is_some_and(|p| p.alarm_state.is_triggered());
        if current.alarm_state.is_triggered() && !was_triggered {
            let zones = alarmed_zones;
            let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
            warn!("Panel {} triggered (zones: {})", self.host, names.join(", "));
            self.emit_if_enabled(PanelEvent::Triggered { zones });
        }
        self.emit(PanelEvent::SnapshotUpdated(current.clone()));
    }

    // --- Commands ---

    pub async fn arm_away(&self) -> Result<()> {
        self.ensure_open()?;
        info!("Arming panel {} (away)", self.host);
        self.client.lock().await.arm_away().await?;
        self.emit_if_enabled(PanelEvent::ArmedAway);
        Ok(())
    }

    pub async fn arm_home(&self) -> Result<()> {
        self.ensure_open()?;
        info!("Arming panel {} (home/stay)", self.host);
        self.client.lock().await.arm_stay().await?;
        self.emit_if_enabled(PanelEvent::ArmedHome);
        Ok(())
    }

    /// Disarm the panel. A non-empty code is mandatory; without one the
    /// device is never contacted.
    pub async fn disarm(&self, code: Option<&str>) -> Result<()> {
        if code.is_none_or(str::is_empty) {
            error!("Failed to disarm the alarm system. Please enter the disarm code.");
            return Err(IAlarmError::MissingDisarmCode);
        }
        self.ensure_open()?;
        info!("Disarming panel {}", self.host);
        {
            let client = self.client.lock().await;
            client.disarm().await?;
            if self.config.cancel_after_disarm {
                client.cancel_alarm().await?;
            }
        }
        self.emit_if_enabled(PanelEvent::Disarmed);
        Ok(())
    }

    /// Silence a sounding alarm without changing the arm state.
    pub async fn cancel_alarm(&self) -> Result<()> {
        self.ensure_open()?;
        info!("Cancelling alarm on panel {}", self.host);
        self.client.lock().await.cancel_alarm().await?;
        self.emit_if_enabled(PanelEvent::AlarmCancelled);
        Ok(())
    }

    /// Fetch up to `max_entries` log records, in the order the panel reports them.
    pub async fn get_log(&self, max_entries: usize) -> Result<Vec<LogEntry>> {
        self.ensure_open()?;
        debug!("Requesting {} log entries from {}", max_entries, self.host);
        let mut entries = self
            .client
            .lock()
            .await
            .get_last_log_entries(max_entries)
            .await?;
        entries.truncate(max_entries);
        if entries.is_empty() {
            debug!("Panel {} returned no log entries", self.host);
            return Ok(Vec::new());
        }

        let normalized = entries.iter().map(LogEntry::from).collect();
        self.emit_if_enabled(PanelEvent::LogsRetrieved { entries });
        Ok(normalized)
    }

    /// [`get_log`](Self::get_log) with the configured default size.
    pub async fn get_recent_log(&self) -> Result<Vec<LogEntry>> {
        self.get_log(self.config.log_max_entries).await
    }

    // --- Lifecycle ---

    /// Stop scheduling polls, wait for an in-flight poll to finish and release
    /// the client.
    pub async fn shutdown(&self) {
        info!("Shutting down coordinator for {}", self.host);
        self.shutdown_tx.send_replace(true);

        let handle = self.loop_handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Poll loop for {} ended abnormally: {}", self.host, e);
            }
        }

        self.release().await;
    }

    async fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        let client = self.client.lock().await;
        close_client(&*client, &self.host).await;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.released.load(Ordering::SeqCst) {
            Err(IAlarmError::ShutDown)
        } else {
            Ok(())
        }
    }

    async fn set_poll_state(&self, state: PollState) {
        *self.poll_state.write().await = state;
    }

    fn emit(&self, event: PanelEvent) {
        let _ = self.event_tx.send(event);
    }

    fn emit_if_enabled(&self, event: PanelEvent) {
        if self.config.send_events {
            self.emit(event);
        } else {
            debug!("Event {} suppressed (events disabled)", event.name());
        }
    }
}

impl<C: DeviceClient> Drop for PanelCoordinator<C> {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

async fn poll_loop<C: DeviceClient>(
    coordinator: Weak<PanelCoordinator<C>>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // The first refresh happens during setup.
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("Poll loop shutting down");
                    break;
                }
                continue;
            }
        }

        if *shutdown_rx.borrow() {
            break;
        }
        let Some(coordinator) = coordinator.upgrade() else {
            break;
        };
        // Failures are already reported; the next tick is the retry.
        let _ = coordinator.refresh().await;
    }
}

/// Raw results of one poll.
struct Polled {
    status: u8,
    zones: Vec<RawZone>,
    alarmed_zones: Vec<ZoneRecord>,
}

async fn fetch_status<C: DeviceClient>(client: &C) -> Result<Polled> {
    let zones = client.get_zone_status().await?;
    let report = client.get_status_with_zones(&zones).await?;
    let alarmed_zones = report
        .alarmed_zones
        .iter()
        .filter_map(ZoneRecord::from_raw)
        .collect();
    Ok(Polled {
        status: report.status_value,
        zones,
        alarmed_zones,
    })
}

async fn close_client<C: DeviceClient>(client: &C, host: &str) {
    match client.close().await {
        Ok(()) => debug!("Connection to {} released", host),
        Err(e) => warn!("Error closing connection to {}: {}", host, e),
    }
}

async fn with_timeout<T>(
    limit: Duration,
    operation: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(IAlarmError::Timeout {
            operation,
            after_ms: limit.as_millis() as u64,
        }),
    }
}

fn not_ready(host: String, source: IAlarmError) -> IAlarmError {
    IAlarmError::NotReady {
        host,
        source: Box::new(source),
    }
}
