// MIT License - Copyright (c) 2026 Peter Wright
// Commands against a simulated panel
//
//! Example: arm, trip, disarm and read the log of a simulated panel.

#[path = "simulated_panel.rs"]
mod simulated_panel;

use std::sync::Arc;

use clap::Parser;
use ialarm_bridge::{PanelConfig, PanelCoordinator, PanelEvent};
use tokio::time::Duration;

use simulated_panel::SimulatedPanel;

#[derive(Parser)]
#[command(name = "panel_commands")]
#[command(about = "Drive a simulated iAlarm panel through a few commands")]
struct Cli {
    /// Disarm code to send
    #[arg(long, default_value = "1234")]
    code: String,

    /// Number of log entries to print
    #[arg(long, default_value_t = 10)]
    log_entries: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let panel = Arc::new(SimulatedPanel::new("192.168.1.81"));
    let config = PanelConfig::builder()
        .host("192.168.1.81")
        .scan_interval(Duration::from_secs(2))
        .build();
    let coordinator = PanelCoordinator::setup(Arc::clone(&panel), config).await?;
    coordinator.start().await;

    let mut events = coordinator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match &event {
                PanelEvent::SnapshotUpdated(snapshot) => println!(
                    "  snapshot: {} (alarm={})",
                    snapshot.alarm_state, snapshot.alarm_active
                ),
                other => println!("  event {}: {}", other.name(), other.payload()),
            }
        }
    });

    if let Some(snapshot) = coordinator.snapshot() {
        println!("Panel {} is {}", coordinator.mac(), snapshot.alarm_state);
        for zone in &snapshot.zones {
            println!("  Zone {:2}: {:15} {}", zone.id, zone.name, zone.status_label());
        }
    }

    println!("\nArming away...");
    coordinator.arm_away().await?;
    coordinator.refresh().await?;

    println!("\nTripping zone 2...");
    panel.trip_zone(2)?;
    tokio::time::sleep(Duration::from_secs(3)).await;
    if let Some(snapshot) = coordinator.snapshot() {
        for zone in snapshot.alarmed_zones() {
            println!("  In alarm: zone {} ({})", zone.id, zone.name);
        }
    }

    println!("\nDisarming without a code...");
    if let Err(e) = coordinator.disarm(None).await {
        println!("Refused: {e}");
    }

    println!("\nDisarming with code...");
    coordinator.disarm(Some(cli.code.as_str())).await?;
    coordinator.refresh().await?;

    println!("\nLast {} log entries:", cli.log_entries);
    for entry in coordinator.get_log(cli.log_entries).await? {
        println!("  {} area {} {:20} {}", entry.time, entry.area, entry.event, entry.name);
    }

    coordinator.shutdown().await;
    Ok(())
}
