//! Demo shell for the printer bridge: scans for nearby printers, picks one
//! (first discovered, or the device id given as the first argument), and
//! sends it a sample receipt.

use std::path::Path;

use anyhow::{Result, anyhow};
use log::info;

use ble_receipt_printer::{EventSender, PrinterConfig, PrinterEvent, PrinterManager};

const SAMPLE_RECEIPT: &str = "<b>Hello Printer</b><br>Printed from the receipt bridge!";

#[tokio::main]
async fn main() -> Result<()> {
    ble_receipt_printer::init_logging();

    let target = std::env::args().nth(1);
    let config = PrinterConfig::load_config(Path::new(".")).await?;

    let (events, mut event_rx) = EventSender::channel();
    let mut manager = PrinterManager::new(config, events).await?;

    manager.start_scan().await?;
    while let Some(event) = event_rx.recv().await {
        match event {
            PrinterEvent::DeviceFound(printer) => {
                info!(
                    "Discovered {} ({})",
                    printer.name.as_deref().unwrap_or("Unnamed Device"),
                    printer.id
                );
            }
            PrinterEvent::ScanComplete => break,
            _ => {}
        }
    }

    let device_id = match target {
        Some(id) => id,
        None => manager
            .discovered_devices()
            .first()
            .map(|printer| printer.id.clone())
            .ok_or_else(|| anyhow!("No printers discovered"))?,
    };

    manager.print_markup(&device_id, SAMPLE_RECEIPT).await?;
    info!("Printed successfully");
    Ok(())
}
