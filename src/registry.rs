// MIT License - Copyright (c) 2026 Peter Wright
// Coordinators keyed by device identity

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::client::DeviceClient;
use crate::coordinator::PanelCoordinator;
use crate::error::{IAlarmError, Result};

/// Explicit map of running coordinators, keyed by MAC address.
pub struct PanelRegistry<C: DeviceClient> {
    panels: HashMap<String, Arc<PanelCoordinator<C>>>,
}

impl<C: DeviceClient> Default for PanelRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DeviceClient> PanelRegistry<C> {
    pub fn new() -> Self {
        Self {
            panels: HashMap::new(),
        }
    }

    /// Register a coordinator under its MAC. A second panel with the same
    /// identity is refused and left untouched.
    pub fn insert(&mut self, coordinator: Arc<PanelCoordinator<C>>) -> Result<()> {
        let mac = coordinator.mac().to_string();
        if self.panels.contains_key(&mac) {
            return Err(IAlarmError::DuplicatePanel { mac });
        }
        info!("Registered panel {} ({})", mac, coordinator.host());
        self.panels.insert(mac, coordinator);
        Ok(())
    }

    pub fn get(&self, mac: &str) -> Option<&Arc<PanelCoordinator<C>>> {
        self.panels.get(mac)
    }

    /// Remove a panel and shut its coordinator down. Returns whether it existed.
    pub async fn remove(&mut self, mac: &str) -> bool {
        match self.panels.remove(mac) {
            Some(coordinator) => {
                coordinator.shutdown().await;
                info!("Unregistered panel {}", mac);
                true
            }
            None => false,
        }
    }

    pub async fn shutdown_all(&mut self) {
        for (_, coordinator) in self.panels.drain() {
            coordinator.shutdown().await;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PanelCoordinator<C>>> {
        self.panels.values()
    }

    pub fn macs(&self) -> Vec<&str> {
        let mut macs: Vec<&str> = self.panels.keys().map(String::as_str).collect();
        macs.sort_unstable();
        macs
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }
}
