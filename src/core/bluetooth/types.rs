//! Defines shared data structures for the Bluetooth module.

use bluest::Characteristic;
use uuid::Uuid;

/// Represents a discovered printer candidate
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiscoveredPrinter {
    /// Platform-specific unique identifier for the device (especially important on macOS)
    pub id: String,
    /// The name of the device, if available
    pub name: Option<String>,
    /// The address of the device (MAC address on most platforms, may be unavailable on macOS)
    pub address: Option<String>,
    /// The signal strength (RSSI) at discovery time
    pub rssi: Option<i16>,
}

impl DiscoveredPrinter {
    pub fn new(id: String, name: Option<String>, address: Option<String>, rssi: Option<i16>) -> Self {
        Self { id, name, address, rssi }
    }
}

/// The writable channel resolved on a connected device.
/// Holds the active handles needed for one print session.
#[derive(Clone)]
pub struct ResolvedChannel {
    /// Service the channel was found under.
    pub service_uuid: Uuid,
    /// The characteristic handle print data is written to.
    pub write_characteristic: Characteristic,
    /// Status characteristic, read best-effort before writing, when present.
    pub status_characteristic: Option<Characteristic>,
}
