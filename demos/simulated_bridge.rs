// MIT License - Copyright (c) 2026 Peter Wright
// MQTT bridge over simulated panels
//
//! Example: publish simulated iAlarm panels on an MQTT broker.
//!
//! ```text
//! cargo run --example simulated_bridge -- --config demos/bridge.toml
//! mosquitto_pub -t ialarm/<mac>/cmd -m '{"op":"DISARM","code":"1234"}'
//! ```

#[path = "simulated_panel.rs"]
mod simulated_panel;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ialarm_bridge::{bridge, BridgeConfig, PanelCoordinator, PanelRegistry};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{info, warn};

use simulated_panel::SimulatedPanel;

#[derive(Parser)]
#[command(name = "simulated_bridge")]
#[command(about = "Bridge simulated iAlarm panels to MQTT")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "demos/bridge.toml")]
    config: String,

    /// Trip zone 1 on every panel after this many seconds
    #[arg(long)]
    trip_after_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity (e.g. RUST_LOG=ialarm_bridge=debug). Default: info.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // systemd journal already adds timestamps, so omit them when running under systemd
    if std::env::var_os("JOURNAL_STREAM").is_some() {
        tracing_subscriber::fmt().without_time().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let cli = Cli::parse();
    let config = BridgeConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config file {}", cli.config))?;

    let mut registry = PanelRegistry::new();
    let mut panels = Vec::new();
    for panel_config in config.panel_configs() {
        let host = panel_config.host.clone();
        let panel = Arc::new(SimulatedPanel::new(&host));
        let coordinator = PanelCoordinator::setup(Arc::clone(&panel), panel_config)
            .await
            .with_context(|| format!("Panel {host} failed to start"))?;
        coordinator.start().await;
        if let Err(e) = registry.insert(Arc::clone(&coordinator)) {
            warn!("Skipping panel {host}: {e}");
            coordinator.shutdown().await;
            continue;
        }
        panels.push(panel);
    }
    anyhow::ensure!(!registry.is_empty(), "No panels configured");

    if let Some(secs) = cli.trip_after_secs {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            for panel in &panels {
                if let Err(e) = panel.trip_zone(1) {
                    warn!("Failed to trip simulated zone: {e}");
                }
            }
            info!("Tripped zone 1 on {} simulated panel(s)", panels.len());
        });
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let coordinators = registry.iter().cloned().collect();
    let mqtt = config.mqtt.clone();
    let bridge_handle =
        tokio::spawn(async move { bridge::run(&mqtt, coordinators, shutdown_rx).await });

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down..."),
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
    }

    shutdown_tx.send_replace(true);
    match bridge_handle.await {
        Ok(result) => result?,
        Err(e) => warn!("Bridge task ended abnormally: {e}"),
    }
    registry.shutdown_all().await;

    info!("Shutdown complete");
    Ok(())
}
