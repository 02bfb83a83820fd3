//! Events emitted towards the embedding UI shell.
//! The shell subscribes to the receiving half of the channel and renders
//! scan progress and print outcomes however it likes.

use log::debug;
use tokio::sync::mpsc;

use crate::core::bluetooth::DiscoveredPrinter;

/// Progress events for one screen's worth of UI state.
#[derive(Debug, Clone)]
pub enum PrinterEvent {
    /// A discovery window was opened.
    ScanStarted,
    /// A new device record entered the discovered list.
    DeviceFound(DiscoveredPrinter),
    /// The discovery window closed and its listener was released.
    ScanComplete,
    /// A connection attempt to the given device started.
    Connecting { device_id: String },
    /// The payload is being transmitted to the resolved channel.
    Writing { bytes: usize },
    /// The full payload was written.
    PrintComplete,
    /// Session teardown finished (attempted for every outcome).
    Disconnected,
}

/// Sending half handed to the core; cheap to clone into tasks.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<PrinterEvent>,
}

impl EventSender {
    /// Creates the event channel and returns the receiver for the UI shell.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PrinterEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: PrinterEvent) {
        // A dropped receiver just means nobody is rendering; not an error.
        if self.tx.send(event).is_err() {
            debug!("No event subscriber, event dropped");
        }
    }
}
