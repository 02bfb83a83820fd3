//! Printer bridge configuration, persisted as a JSON file next to the
//! application's other state.

use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;
use uuid::Uuid;

use crate::core::bluetooth::{
    DEFAULT_CHUNK_SIZE, DEFAULT_SCAN_DURATION_SECS, PRINTER_SERVICE_UUID,
    PRINTER_STATUS_CHAR_UUID, PRINTER_WRITE_CHAR_UUID,
};

const CONFIG_FILE_NAME: &str = "printer_config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// Length of the discovery window in seconds.
    pub scan_duration_secs: u64,

    /// Only list devices whose advertised name contains this substring.
    /// `None` lists everything in range.
    pub name_filter: Option<String>,

    /// Service the printer is expected to expose.
    pub service_uuid: Uuid,

    /// Characteristic print data is written to.
    pub write_characteristic_uuid: Uuid,

    /// Characteristic holding printer status, read best-effort before a job.
    pub status_characteristic_uuid: Uuid,

    /// When the configured service or write characteristic is absent,
    /// enumerate the device and take the first writable characteristic.
    pub discovery_fallback: bool,

    /// Largest single write; payloads above this are split into chunks.
    pub chunk_size: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            scan_duration_secs: DEFAULT_SCAN_DURATION_SECS,
            name_filter: None,
            service_uuid: PRINTER_SERVICE_UUID,
            write_characteristic_uuid: PRINTER_WRITE_CHAR_UUID,
            status_characteristic_uuid: PRINTER_STATUS_CHAR_UUID,
            discovery_fallback: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PrinterConfig {
    /// Loads the config from a configuration file in `config_dir`.
    pub async fn load_config(config_dir: &Path) -> Result<Self> {
        let file_path = config_dir.join(CONFIG_FILE_NAME);

        if !file_path.exists() {
            warn!("Config file not found at {:?}, using default.", file_path);
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(&file_path).await?;
        let mut config: Self = serde_json::from_str(&config_json)?;

        if config.chunk_size == 0 {
            warn!("chunk_size of 0 is invalid, using default of {}", DEFAULT_CHUNK_SIZE);
            config.chunk_size = DEFAULT_CHUNK_SIZE;
        }

        info!("Config loaded from {:?}", file_path);
        Ok(config)
    }

    /// Saves the current config to a configuration file in `config_dir`.
    pub async fn save_config(&self, config_dir: &Path) -> Result<()> {
        ensure_directory_exists(config_dir).await?;
        let file_path = config_dir.join(CONFIG_FILE_NAME);

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize printer config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(&file_path, config_json).await?;

        info!("Printer config saved to {:?}.", file_path);
        Ok(())
    }
}

/// Asynchronously ensures that a directory exists, creating it if it does not.
/// This function is idempotent.
async fn ensure_directory_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path).await?;
        info!("Created directory at: {:?}", path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_the_standard_printer_attributes() {
        let config = PrinterConfig::default();
        assert_eq!(config.scan_duration_secs, 10);
        assert_eq!(config.service_uuid, PRINTER_SERVICE_UUID);
        assert_eq!(config.write_characteristic_uuid, PRINTER_WRITE_CHAR_UUID);
        assert!(config.discovery_fallback);
        assert!(config.chunk_size > 0);
    }

    #[tokio::test]
    async fn load_config_round_trips_through_json() {
        let dir = std::env::temp_dir().join("ble-receipt-printer-config-test");
        let mut config = PrinterConfig::default();
        config.scan_duration_secs = 3;
        config.name_filter = Some("Printer".to_string());
        config.save_config(&dir).await.unwrap();

        let loaded = PrinterConfig::load_config(&dir).await.unwrap();
        assert_eq!(loaded.scan_duration_secs, 3);
        assert_eq!(loaded.name_filter.as_deref(), Some("Printer"));

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn missing_config_file_falls_back_to_default() {
        let dir = std::env::temp_dir().join("ble-receipt-printer-no-such-config");
        let loaded = PrinterConfig::load_config(&dir).await.unwrap();
        assert_eq!(loaded.scan_duration_secs, PrinterConfig::default().scan_duration_secs);
    }
}
