//! Bluetooth functionality for the receipt printer bridge.
//! This module handles all bluetooth operations including scanning,
//! connecting, and writing print payloads to a printer.

mod connection;
mod constants;
mod manager;
mod scanner;
mod session;
mod types;

// Re-export types that should be publicly accessible
pub use connection::{BluestLink, ConnectionManager};
pub use constants::*; // Re-export all constants
pub use manager::PrinterManager;
pub use scanner::{DeviceRegistry, PrinterScanner};
pub use session::{PrintSession, PrinterLink};
pub use types::{DiscoveredPrinter, ResolvedChannel};
