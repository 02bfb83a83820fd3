//! Core functionality for the receipt printer bridge.
//! This module contains payload construction and the Bluetooth session core.

pub mod bluetooth;
pub mod payload;

// Re-export commonly used types
pub use bluetooth::PrinterManager;
pub use payload::{Alignment, PrinterCommand, ReceiptBuilder};
