//! Constants used throughout the bridge: well-known printer UUIDs,
//! the discovery window, and transmission sizing.

use uuid::Uuid;

/// Serial-over-GATT service exposed by common thermal receipt printers
pub const PRINTER_SERVICE_UUID: Uuid = Uuid::from_u128(0x000018f0_0000_1000_8000_00805f9b34fb);

/// Characteristic print data is written to
pub const PRINTER_WRITE_CHAR_UUID: Uuid = Uuid::from_u128(0x00002af1_0000_1000_8000_00805f9b34fb);

/// Characteristic carrying printer status, readable before a job
pub const PRINTER_STATUS_CHAR_UUID: Uuid = Uuid::from_u128(0x00002af0_0000_1000_8000_00805f9b34fb);

/// Length of the discovery window in seconds
pub const DEFAULT_SCAN_DURATION_SECS: u64 = 10;

/// Largest single characteristic write; conservative for a default BLE MTU
pub const DEFAULT_CHUNK_SIZE: usize = 180;
