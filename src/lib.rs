//! BLE receipt printer bridge library.
//! Discovers nearby Bluetooth Low Energy thermal receipt printers, connects
//! to one, and sends it a formatted text payload to print. The embedding UI
//! shell drives [`PrinterManager`] and renders [`PrinterEvent`]s.

// Module declarations
pub mod config;
pub mod core;
pub mod error;
pub mod events;

pub use crate::config::PrinterConfig;
pub use crate::core::bluetooth::PrinterManager;
pub use crate::core::payload::{Alignment, PrinterCommand, ReceiptBuilder};
pub use crate::error::PrintError;
pub use crate::events::{EventSender, PrinterEvent};

/// Initialize logging for binaries embedding the bridge.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Logging initialized");
}
