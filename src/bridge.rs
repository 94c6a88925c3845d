// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::client::DeviceClient;
use crate::config::{parse_mqtt_url, MqttToml};
use crate::constants::MANUFACTURER;
use crate::coordinator::PanelCoordinator;
use crate::devices::ZoneRecord;
use crate::event::PanelEvent;
use crate::snapshot::Snapshot;
use crate::status::AlarmState;

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

/// MQTT topics of one panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelTopics {
    pub state: String,
    pub event: String,
    pub cmd: String,
}

impl PanelTopics {
    pub fn new(prefix: &str, mac: &str) -> Self {
        let base = format!("{}/{}", prefix.trim_end_matches('/'), topic_segment(mac));
        Self {
            state: format!("{base}/state"),
            event: format!("{base}/event"),
            cmd: format!("{base}/cmd"),
        }
    }
}

/// MACs contain ':' which is legal in topics but awkward to subscribe to by hand.
fn topic_segment(mac: &str) -> String {
    mac.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// MQTT JSON types
// ---------------------------------------------------------------------------

// Published messages share the {now, op, ...} flat structure

#[derive(Debug, Serialize)]
pub struct MqttDeviceInfo {
    pub manufacturer: &'static str,
    pub mac: String,
    pub host: String,
}

#[derive(Debug, Serialize)]
pub struct MqttZoneState {
    pub id: u32,
    pub name: String,
    pub status: Vec<&'static str>,
    pub used: bool,
    pub alarm: bool,
    pub bypass: bool,
    pub fault: bool,
    #[serde(rename = "lowBattery")]
    pub low_battery: bool,
    pub lost: bool,
}

impl From<&ZoneRecord> for MqttZoneState {
    fn from(zone: &ZoneRecord) -> Self {
        Self {
            id: zone.id,
            name: zone.name.clone(),
            status: zone.status.labels(),
            used: !zone.is_not_used(),
            alarm: zone.is_alarm(),
            bypass: zone.is_bypassed(),
            fault: zone.is_fault(),
            low_battery: zone.is_low_battery(),
            lost: zone.is_lost(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MqttStateMessage {
    pub now: u64,
    pub op: &'static str,
    pub device: MqttDeviceInfo,
    pub alarm_state: AlarmState,
    pub alarm_active: bool,
    pub anomaly_present: bool,
    pub zones: Vec<MqttZoneState>,
    pub attributes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct MqttEventMessage {
    pub now: u64,
    pub op: &'static str,
    pub data: Value,
}

#[derive(Debug, Serialize)]
pub struct MqttCmdAck {
    pub now: u64,
    pub op: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Inbound command (subscribed)
#[derive(Debug, Clone, Deserialize)]
pub struct MqttCommand {
    pub op: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub max_entries: Option<usize>,
}

/// Result of routing one command to a coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub success: bool,
    pub data: Option<Value>,
}

impl CommandOutcome {
    fn failed() -> Self {
        Self {
            success: false,
            data: None,
        }
    }

    fn from_unit(op: &str, host: &str, result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => {
                info!("{op} {host}: success");
                Self {
                    success: true,
                    data: None,
                }
            }
            Err(e) => {
                error!("{op} {host} failed: {e}");
                Self::failed()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

pub fn build_state_message(snapshot: &Snapshot, mac: &str, host: &str) -> MqttStateMessage {
    MqttStateMessage {
        now: now_epoch_ms(),
        op: "STATE",
        device: MqttDeviceInfo {
            manufacturer: MANUFACTURER,
            mac: mac.to_string(),
            host: host.to_string(),
        },
        alarm_state: snapshot.alarm_state,
        alarm_active: snapshot.alarm_active,
        anomaly_present: snapshot.anomaly_present,
        zones: snapshot.zones.iter().map(MqttZoneState::from).collect(),
        attributes: snapshot.zone_attributes(),
    }
}

/// Event topic message for a coordinator event. Snapshot updates go to the
/// state topic instead and yield `None`.
pub fn build_event_message(event: &PanelEvent) -> Option<MqttEventMessage> {
    match event {
        PanelEvent::SnapshotUpdated(_) => None,
        other => Some(MqttEventMessage {
            now: now_epoch_ms(),
            op: other.name(),
            data: other.payload(),
        }),
    }
}

pub fn build_cmd_ack(outcome: CommandOutcome, src: Option<Value>) -> MqttCmdAck {
    MqttCmdAck {
        now: now_epoch_ms(),
        op: "CMD_ACK",
        success: outcome.success,
        src,
        data: outcome.data,
    }
}

async fn publish_json(client: &AsyncClient, topic: &str, payload: &impl Serialize, retain: bool) {
    match serde_json::to_string(payload) {
        Ok(json) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, retain, json).await {
                error!("Failed to publish to {topic}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize MQTT payload: {e}"),
    }
}

// ---------------------------------------------------------------------------
// MQTT command handler
// ---------------------------------------------------------------------------

/// Run one inbound command against a coordinator.
pub async fn execute_command<C: DeviceClient>(
    coordinator: &PanelCoordinator<C>,
    cmd: &MqttCommand,
) -> CommandOutcome {
    let host = coordinator.host();
    match cmd.op.as_str() {
        "ARM_AWAY" => CommandOutcome::from_unit("ARM_AWAY", host, coordinator.arm_away().await),
        "ARM_HOME" => CommandOutcome::from_unit("ARM_HOME", host, coordinator.arm_home().await),
        "DISARM" => CommandOutcome::from_unit(
            "DISARM",
            host,
            coordinator.disarm(cmd.code.as_deref()).await,
        ),
        "CANCEL" => CommandOutcome::from_unit("CANCEL", host, coordinator.cancel_alarm().await),
        "GET_LOG" => {
            let max_entries = cmd
                .max_entries
                .unwrap_or(coordinator.config().log_max_entries);
            match coordinator.get_log(max_entries).await {
                Ok(entries) => CommandOutcome {
                    success: true,
                    data: Some(json!({ "entries": entries })),
                },
                Err(e) => {
                    error!("GET_LOG {host} failed: {e}");
                    CommandOutcome::failed()
                }
            }
        }
        "REFRESH" => match coordinator.refresh().await {
            Ok(snapshot) => CommandOutcome {
                success: true,
                data: serde_json::to_value(&*snapshot).ok(),
            },
            Err(e) => {
                warn!("REFRESH {host} failed: {e}");
                CommandOutcome::failed()
            }
        },
        other => {
            warn!("Unknown command: {other}");
            CommandOutcome::failed()
        }
    }
}

async fn handle_command<C: DeviceClient>(
    payload: &str,
    client: &AsyncClient,
    topics: &PanelTopics,
    coordinator: &PanelCoordinator<C>,
) {
    // The raw payload is echoed back as the CMD_ACK src field
    let src_json = serde_json::from_str::<Value>(payload).ok();

    let outcome = match serde_json::from_str::<MqttCommand>(payload) {
        Ok(cmd) => {
            info!("MQTT command received for {}: {}", coordinator.mac(), cmd.op);
            execute_command(coordinator, &cmd).await
        }
        Err(e) => {
            warn!("Failed to parse MQTT command: {e}");
            CommandOutcome::failed()
        }
    };
    publish_json(client, &topics.event, &build_cmd_ack(outcome, src_json), false).await;
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

struct BridgedPanel<C: DeviceClient> {
    coordinator: Arc<PanelCoordinator<C>>,
    topics: PanelTopics,
}

/// Publishes coordinators on MQTT and routes their command topics until
/// `shutdown` flips to `true`.
///
/// The coordinators stay owned by the caller; the bridge only subscribes to
/// them.
pub async fn run<C: DeviceClient>(
    mqtt: &MqttToml,
    coordinators: Vec<Arc<PanelCoordinator<C>>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    let (mqtt_host, mqtt_port) = parse_mqtt_url(&mqtt.url).context("Invalid MQTT URL")?;
    let mut mqtt_opts = MqttOptions::new(&mqtt.client_id, &mqtt_host, mqtt_port);
    mqtt_opts.set_keep_alive(Duration::from_secs(mqtt.keep_alive_secs));
    let (client, mut eventloop) = AsyncClient::new(mqtt_opts, 256);
    info!("MQTT: connecting to {mqtt_host}:{mqtt_port}");

    let panels: Arc<HashMap<String, BridgedPanel<C>>> = Arc::new(
        coordinators
            .into_iter()
            .map(|coordinator| {
                let topics = PanelTopics::new(&mqtt.topic_prefix, coordinator.mac());
                (topics.cmd.clone(), BridgedPanel { coordinator, topics })
            })
            .collect(),
    );

    // Task per panel: coordinator events -> MQTT
    let mut handles = Vec::new();
    for panel in panels.values() {
        let coordinator = Arc::clone(&panel.coordinator);
        let topics = panel.topics.clone();
        let client_events = client.clone();
        let mut rx = coordinator.subscribe();
        handles.push(tokio::spawn(async move {
            if let Some(snapshot) = coordinator.snapshot() {
                let msg = build_state_message(&snapshot, coordinator.mac(), coordinator.host());
                publish_json(&client_events, &topics.state, &msg, true).await;
            }
            loop {
                match rx.recv().await {
                    Ok(PanelEvent::SnapshotUpdated(snapshot)) => {
                        let msg =
                            build_state_message(&snapshot, coordinator.mac(), coordinator.host());
                        publish_json(&client_events, &topics.state, &msg, true).await;
                    }
                    Ok(event) => {
                        if let Some(msg) = build_event_message(&event) {
                            if event.is_command_confirmation() {
                                info!("Panel {} confirmed {}", coordinator.mac(), msg.op);
                            } else {
                                debug!("Publishing {} for {}", msg.op, coordinator.mac());
                            }
                            publish_json(&client_events, &topics.event, &msg, false).await;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        warn!("Event receiver lagged, missed {n} events");
                    }
                    Err(RecvError::Closed) => {
                        info!("Event channel closed");
                        break;
                    }
                }
            }
        }));
    }

    // MQTT event loop (receives messages, dispatches commands)
    let client_cmds = client.clone();
    let panels_cmds = Arc::clone(&panels);
    handles.push(tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // rumqttc does not resubscribe on reconnect
                    for topic in panels_cmds.keys() {
                        info!("MQTT: connected, subscribing to {topic}");
                        if let Err(e) = client_cmds.subscribe(topic, QoS::AtLeastOnce).await {
                            error!("Failed to subscribe to {topic}: {e}");
                        }
                    }
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    let Some(panel) = panels_cmds.get(&msg.topic) else {
                        continue;
                    };
                    let payload = String::from_utf8_lossy(&msg.payload).into_owned();
                    let coordinator = Arc::clone(&panel.coordinator);
                    let topics = panel.topics.clone();
                    let client = client_cmds.clone();
                    // Commands may wait on a poll; keep the event loop moving.
                    tokio::spawn(async move {
                        handle_command(&payload, &client, &topics, &coordinator).await;
                    });
                }
                Ok(_) => {}
                Err(e) => {
                    error!("MQTT event loop error: {e}");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }
    }));

    info!("MQTT bridge running for {} panel(s)", panels.len());
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }

    for handle in &handles {
        handle.abort();
    }
    if let Err(e) = client.disconnect().await {
        debug!("MQTT disconnect: {e}");
    }
    info!("MQTT bridge stopped");
    Ok(())
}
