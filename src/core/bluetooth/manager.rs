//! Bluetooth manager for the printer bridge.
//! This module provides the main interface the UI shell drives: scanning
//! for printer candidates and running print sessions against one of them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use bluest::{Adapter, Device};
use log::info;

use crate::config::PrinterConfig;
use crate::core::bluetooth::connection::{BluestLink, ConnectionManager};
use crate::core::bluetooth::scanner::{DeviceRegistry, PrinterScanner};
use crate::core::bluetooth::session::PrintSession;
use crate::core::bluetooth::types::DiscoveredPrinter;
use crate::core::payload;
use crate::error::PrintError;
use crate::events::EventSender;

/// Manages discovery and print sessions over one Bluetooth adapter.
pub struct PrinterManager {
    config: PrinterConfig,
    /// Map of device identifiers to bluest handles from the last scan
    devices: Arc<Mutex<HashMap<String, Device>>>,
    /// UI-facing discovered list, deduplicated by identifier
    registry: Arc<Mutex<DeviceRegistry>>,
    connection_manager: ConnectionManager,
    scanner: PrinterScanner,
    events: EventSender,
}

impl PrinterManager {
    /// Creates a new PrinterManager on the default adapter.
    pub async fn new(config: PrinterConfig, events: EventSender) -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or(PrintError::AdapterUnavailable)?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        let devices = Arc::new(Mutex::new(HashMap::new()));
        let registry = Arc::new(Mutex::new(DeviceRegistry::new()));

        let connection_manager = ConnectionManager::new(adapter.clone());
        let scanner = PrinterScanner::new(adapter, devices.clone(), registry.clone());

        Ok(Self {
            config,
            devices,
            registry,
            connection_manager,
            scanner,
            events,
        })
    }

    /// Opens a discovery window of the configured duration. Results arrive
    /// as `DeviceFound` events and through [`discovered_devices`].
    ///
    /// [`discovered_devices`]: PrinterManager::discovered_devices
    pub async fn start_scan(&mut self) -> Result<()> {
        self.scanner
            .start_scan(
                self.events.clone(),
                Duration::from_secs(self.config.scan_duration_secs),
                self.config.name_filter.clone(),
            )
            .await
    }

    /// Stops an in-flight scan before its window elapses.
    pub async fn stop_scan(&mut self) -> Result<()> {
        self.scanner.stop_scan().await
    }

    /// Snapshot of the discovered list from the current scan session.
    pub fn discovered_devices(&self) -> Vec<DiscoveredPrinter> {
        self.registry.lock().unwrap().snapshot()
    }

    /// Prints plain text to the chosen device; the trailing feed is added.
    pub async fn print_text(&self, device_id: &str, text: &str) -> Result<()> {
        self.print_payload(device_id, payload::render_plain_text(text))
            .await
    }

    /// Strips simple markup from `markup` and prints the result.
    pub async fn print_markup(&self, device_id: &str, markup: &str) -> Result<()> {
        self.print_payload(device_id, payload::render_markup(markup))
            .await
    }

    /// Prints a pre-built receipt payload, e.g. from
    /// [`payload::ReceiptBuilder`].
    pub async fn print_receipt(&self, device_id: &str, receipt: Vec<u8>) -> Result<()> {
        self.print_payload(device_id, receipt).await
    }

    /// Runs one full print session: connect, resolve channel, write,
    /// disconnect. Teardown is attempted for every outcome.
    async fn print_payload(&self, device_id: &str, payload: Vec<u8>) -> Result<()> {
        let device = {
            let devices = self.devices.lock().unwrap();
            devices
                .get(device_id)
                .cloned()
                .ok_or_else(|| PrintError::DeviceNotFound(device_id.to_string()))?
        };

        info!(
            "Starting print session to {} ({} byte payload)",
            device_id,
            payload.len()
        );
        let link = BluestLink::new(
            self.connection_manager.clone(),
            device,
            self.config.clone(),
            self.events.clone(),
        );
        let session = PrintSession::new(link, self.config.chunk_size, self.events.clone());
        session.run(&payload).await
    }
}
