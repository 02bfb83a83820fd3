//! Terminal error conditions for a print session.
//! Everything else is passed through as the underlying transport error.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PrintError {
    /// No usable Bluetooth adapter on this host.
    #[error("no Bluetooth adapter found")]
    AdapterUnavailable,

    /// The requested device id was not present in the last scan's results.
    #[error("device not found with ID: {0}")]
    DeviceNotFound(String),

    /// The configured printer service is absent and discovery fallback is
    /// disabled, so there is no channel to write to.
    #[error("printer service {0} not found on device")]
    ServiceNotFound(Uuid),

    /// The device advertises no characteristic with write capability.
    #[error("no writable characteristic advertised by device")]
    NoWritableCharacteristic,
}
