// MIT License - Copyright (c) 2026 Peter Wright
// Polling coordinator for Antifurto365 / Meian iAlarm panels
//
//! # ialarm-bridge
//!
//! Keeps a periodically refreshed, atomically replaced snapshot of an iAlarm
//! security panel (alarm state plus per-zone status) and exposes arm, disarm,
//! cancel and log commands on top of it.
//!
//! The vendor wire protocol is reached through the [`DeviceClient`] trait;
//! this crate supplies everything above it: status normalization, zone
//! aggregation, the polling loop, event emission and an MQTT bridge.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ialarm_bridge::{DeviceClient, PanelConfig, PanelCoordinator};
//!
//! async fn run(client: impl DeviceClient) -> anyhow::Result<()> {
//!     let config = PanelConfig::builder()
//!         .host("192.168.1.81")
//!         .port(18034)
//!         .build();
//!
//!     let coordinator = PanelCoordinator::setup(client, config).await?;
//!     coordinator.start().await;
//!
//!     let mut events = coordinator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {}", event.name());
//!         }
//!     });
//!
//!     coordinator.disarm(Some("1234")).await?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     coordinator.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod devices;
pub mod error;
pub mod event;
pub mod registry;
pub mod snapshot;
pub mod status;

// Re-exports for convenience
pub use client::{DeviceClient, StatusReport};
pub use config::{BridgeConfig, PanelConfig, PanelConfigBuilder};
pub use coordinator::{PanelCoordinator, PollState};
pub use devices::{LogEntry, RawLogEntry, RawZone, ZoneAggregate, ZoneRecord, ZoneStatusFlags};
pub use error::{IAlarmError, Result};
pub use event::{EventReceiver, PanelEvent};
pub use registry::PanelRegistry;
pub use snapshot::Snapshot;
pub use status::{normalize, AlarmState};
