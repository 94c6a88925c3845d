// MIT License - Copyright (c) 2026 Peter Wright
// Panel and bridge configuration

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_HOST, DEFAULT_LOG_MAX_ENTRIES, DEFAULT_PORT, DEFAULT_SCAN_INTERVAL,
    DEFAULT_SEND_EVENTS, DEFAULT_SETUP_TIMEOUT,
};
use crate::error::{IAlarmError, Result};

/// Configuration for one panel coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    /// Panel IP address or hostname
    pub host: String,
    /// Panel TCP port (default: 18034)
    pub port: u16,
    /// Whether command confirmations, log and triggered events are emitted
    pub send_events: bool,
    /// Polling cadence, also the retry interval after a failed poll
    pub scan_interval: Duration,
    /// Bound on identity lookup and the first refresh
    pub setup_timeout: Duration,
    /// Whether a successful disarm is followed by cancel_alarm
    pub cancel_after_disarm: bool,
    /// Number of log entries requested when the caller gives none
    pub log_max_entries: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            send_events: DEFAULT_SEND_EVENTS,
            scan_interval: DEFAULT_SCAN_INTERVAL,
            setup_timeout: DEFAULT_SETUP_TIMEOUT,
            cancel_after_disarm: true,
            log_max_entries: DEFAULT_LOG_MAX_ENTRIES,
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(IAlarmError::InvalidConfig {
                details: "host must not be empty".into(),
            });
        }
        if self.scan_interval.is_zero() {
            return Err(IAlarmError::InvalidConfig {
                details: "scan interval must be positive".into(),
            });
        }
        if self.setup_timeout.is_zero() {
            return Err(IAlarmError::InvalidConfig {
                details: "setup timeout must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn send_events(mut self, send_events: bool) -> Self {
        self.config.send_events = send_events;
        self
    }

    pub fn scan_interval(mut self, interval: Duration) -> Self {
        self.config.scan_interval = interval;
        self
    }

    pub fn setup_timeout(mut self, timeout: Duration) -> Self {
        self.config.setup_timeout = timeout;
        self
    }

    pub fn cancel_after_disarm(mut self, cancel: bool) -> Self {
        self.config.cancel_after_disarm = cancel;
        self
    }

    pub fn log_max_entries(mut self, entries: usize) -> Self {
        self.config.log_max_entries = entries;
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}

// ---------------------------------------------------------------------------
// TOML
// ---------------------------------------------------------------------------

/// Bridge configuration file: one `[mqtt]` table and any number of `[[panels]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub mqtt: MqttToml,
    #[serde(default)]
    pub panels: Vec<PanelToml>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttToml {
    pub url: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

fn default_client_id() -> String {
    "ialarm-bridge".to_string()
}
fn default_topic_prefix() -> String {
    "ialarm".to_string()
}
fn default_keep_alive() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct PanelToml {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_send_events")]
    pub send_events: bool,
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_setup_timeout")]
    pub setup_timeout_secs: u64,
    #[serde(default = "default_cancel_after_disarm")]
    pub cancel_after_disarm: bool,
    #[serde(default = "default_log_max_entries")]
    pub log_max_entries: usize,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_send_events() -> bool {
    DEFAULT_SEND_EVENTS
}
fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL.as_secs()
}
fn default_setup_timeout() -> u64 {
    DEFAULT_SETUP_TIMEOUT.as_secs()
}
fn default_cancel_after_disarm() -> bool {
    true
}
fn default_log_max_entries() -> usize {
    DEFAULT_LOG_MAX_ENTRIES
}

impl From<&PanelToml> for PanelConfig {
    fn from(toml: &PanelToml) -> Self {
        PanelConfig::builder()
            .host(&toml.host)
            .port(toml.port)
            .send_events(toml.send_events)
            .scan_interval(Duration::from_secs(toml.scan_interval_secs))
            .setup_timeout(Duration::from_secs(toml.setup_timeout_secs))
            .cancel_after_disarm(toml.cancel_after_disarm)
            .log_max_entries(toml.log_max_entries)
            .build()
    }
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| IAlarmError::InvalidConfig {
            details: e.to_string(),
        })?;
        for panel in config.panel_configs() {
            panel.validate()?;
        }
        parse_mqtt_url(&config.mqtt.url)?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn panel_configs(&self) -> Vec<PanelConfig> {
        self.panels.iter().map(PanelConfig::from).collect()
    }
}

/// Parse an MQTT URL like "mqtt://host:port" into (host, port).
pub fn parse_mqtt_url(url: &str) -> Result<(String, u16)> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let invalid = || IAlarmError::InvalidConfig {
        details: format!("MQTT URL must be in format mqtt://host:port, got {url}"),
    };

    let (host, port_str) = stripped.rsplit_once(':').ok_or_else(invalid)?;
    let port: u16 = port_str.parse().map_err(|_| invalid())?;
    if host.is_empty() {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
