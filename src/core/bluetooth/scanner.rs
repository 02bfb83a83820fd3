use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use bluest::{Adapter, Device};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::events::{EventSender, PrinterEvent};
use crate::core::bluetooth::types::DiscoveredPrinter;

/// Ordered list of discovered printers, deduplicated by device identifier.
/// First-seen wins; a record is never updated in place.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    order: Vec<DiscoveredPrinter>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record unless its identifier was already seen.
    /// Returns true when the record entered the list.
    pub fn insert(&mut self, printer: DiscoveredPrinter) -> bool {
        if self.order.iter().any(|p| p.id == printer.id) {
            return false;
        }
        self.order.push(printer);
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    pub fn snapshot(&self) -> Vec<DiscoveredPrinter> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Time-bounded BLE discovery for printer candidates.
pub struct PrinterScanner {
    adapter: Adapter,
    devices: Arc<Mutex<HashMap<String, Device>>>,
    registry: Arc<Mutex<DeviceRegistry>>,
    cancel_token: Arc<CancellationToken>,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl PrinterScanner {
    pub fn new(
        adapter: Adapter,
        devices: Arc<Mutex<HashMap<String, Device>>>,
        registry: Arc<Mutex<DeviceRegistry>>,
    ) -> Self {
        Self {
            adapter,
            devices,
            registry,
            cancel_token: Arc::new(CancellationToken::new()),
            scan_task_handle: None,
        }
    }

    /// Opens a new discovery window. Any scan still in flight is cancelled
    /// and awaited first so its listener cannot outlive this window.
    pub async fn start_scan(
        &mut self,
        events: EventSender,
        scan_duration: Duration,
        name_filter: Option<String>,
    ) -> Result<()> {
        if self.scan_task_handle.is_some() {
            self.stop_scan().await?;
        }

        // Clear results from the previous window
        self.devices.lock().unwrap().clear();
        self.registry.lock().unwrap().clear();

        self.cancel_token = Arc::new(CancellationToken::new());
        let cancel_token_for_task = self.cancel_token.clone();

        let adapter_for_task = self.adapter.clone();
        let devices_for_task = self.devices.clone();
        let registry_for_task = self.registry.clone();
        let events_for_task = events.clone();

        let handle = tokio::spawn(async move {
            if let Err(e) = Self::internal_scan_task(
                adapter_for_task,
                devices_for_task,
                registry_for_task,
                events_for_task,
                cancel_token_for_task,
                scan_duration,
                name_filter,
            )
            .await
            {
                error!("Scan task failed: {:#}", e);
            }
        });

        self.scan_task_handle = Some(handle);

        events.emit(PrinterEvent::ScanStarted);
        info!("Device scan task started.");
        Ok(())
    }

    /// Consumes scan results until the window elapses, the stream ends, or
    /// the scan is cancelled, then drops the stream and reports completion.
    async fn internal_scan_task(
        adapter: Adapter,
        devices: Arc<Mutex<HashMap<String, Device>>>,
        registry: Arc<Mutex<DeviceRegistry>>,
        events: EventSender,
        cancel_token: Arc<CancellationToken>,
        scan_duration: Duration,
        name_filter: Option<String>,
    ) -> Result<()> {
        info!("Starting bluetooth scan ({} s window)", scan_duration.as_secs());
        let scan_result = adapter.scan(&[]).await;
        let mut scan_stream = match scan_result {
            Ok(stream) => stream,
            Err(e) => {
                // Radio unavailable: close the window so the UI is not stuck.
                events.emit(PrinterEvent::ScanComplete);
                return Err(e.into());
            }
        };

        let deadline = tokio::time::sleep(scan_duration);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                result = scan_stream.next() => {
                    match result {
                        Some(discovered) => {
                            let device = discovered.device;
                            let rssi = discovered.rssi;
                            debug!("Found device - Device: {:?}, RSSI: {:?}", device, rssi);

                            if Self::matches_filter(&device, name_filter.as_deref()) {
                                Self::record_device(&devices, &registry, &events, device, rssi);
                            }
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = &mut deadline => {
                    info!("Scan window elapsed.");
                    break;
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }

        // Dropping the stream releases the platform scan listener.
        drop(scan_stream);

        let found = registry.lock().unwrap().len();
        info!("Scan complete, {} device(s) discovered", found);
        events.emit(PrinterEvent::ScanComplete);
        Ok(())
    }

    /// Cancels the current window, if any, and waits for its task to finish.
    pub async fn stop_scan(&mut self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();

        if let Some(handle) = self.scan_task_handle.take() {
            info!("Waiting for scan task to finish...");
            match handle.await {
                Ok(()) => info!("Scan task finished after cancellation."),
                Err(e) => {
                    if e.is_cancelled() {
                        info!("Scan task was cancelled successfully.");
                    } else {
                        error!("Scan task finished with an unexpected join error: {:?}", e);
                    }
                }
            }
        } else {
            info!("No active scan task handle found to wait for.");
        }

        Ok(())
    }

    /// Records a scan result, deduplicated by identifier.
    fn record_device(
        devices: &Arc<Mutex<HashMap<String, Device>>>,
        registry: &Arc<Mutex<DeviceRegistry>>,
        events: &EventSender,
        device: Device,
        rssi: Option<i16>,
    ) {
        let id = device.id().to_string();
        let name = device.name().ok();
        let address = Self::extract_mac_address(&id);

        let printer = DiscoveredPrinter::new(id.clone(), name, address, rssi);
        let inserted = registry.lock().unwrap().insert(printer.clone());
        if !inserted {
            return;
        }

        info!(
            "Found printer candidate: ID: {}, Name: {:?}, RSSI: {:?}",
            printer.id, printer.name, printer.rssi
        );
        devices.lock().unwrap().insert(id, device);
        events.emit(PrinterEvent::DeviceFound(printer));
    }

    fn matches_filter(device: &Device, name_filter: Option<&str>) -> bool {
        match name_filter {
            Some(filter) => device
                .name()
                .ok()
                .map(|name| name.contains(filter))
                .unwrap_or(false),
            None => true,
        }
    }

    fn extract_mac_address(device_id_str: &str) -> Option<String> {
        let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").unwrap();
        re.find_iter(device_id_str)
            .last()
            .map(|m| m.as_str().to_uppercase())
    }
}
