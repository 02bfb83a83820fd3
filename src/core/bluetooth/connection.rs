//! Bluetooth connection handling for the printer bridge.
//! This module connects to a chosen device, resolves the writable channel,
//! and provides the production [`PrinterLink`] over bluest.

use anyhow::{Context, Result};
use bluest::{Adapter, Characteristic, Device};
use log::{info, warn};

use crate::config::PrinterConfig;
use crate::core::bluetooth::session::PrinterLink;
use crate::core::bluetooth::types::ResolvedChannel;
use crate::error::PrintError;
use crate::events::{EventSender, PrinterEvent};

/// Connection manager for printer devices
#[derive(Clone)]
pub struct ConnectionManager {
    adapter: Adapter,
}

impl ConnectionManager {
    pub fn new(adapter: Adapter) -> Self {
        Self { adapter }
    }

    /// Connect to the device unless it is already connected.
    pub async fn connect(&self, device: &Device) -> Result<()> {
        if !device.is_connected().await {
            info!("Initiating connection to {}...", device.id());
            self.adapter.connect_device(device).await?;
        }
        info!("Connection to {} established", device.id());
        Ok(())
    }

    /// Resolve the writable channel on a connected device.
    ///
    /// The configured service and write characteristic are tried first.
    /// When they are absent and discovery fallback is enabled, every
    /// advertised characteristic is enumerated and the first one whose
    /// capability flags include write is taken.
    pub async fn resolve_channel(
        &self,
        device: &Device,
        config: &PrinterConfig,
    ) -> Result<ResolvedChannel> {
        info!("Discovering services on {}...", device.id());
        let services = device.services().await?;

        let configured_service = services.iter().find(|s| s.uuid() == config.service_uuid);
        if let Some(service) = configured_service {
            info!("Found configured printer service: {}", service.uuid());
            let characteristics = service.characteristics().await?;

            let write_characteristic = characteristics
                .iter()
                .find(|c| c.uuid() == config.write_characteristic_uuid)
                .cloned();
            let status_characteristic = characteristics
                .iter()
                .find(|c| c.uuid() == config.status_characteristic_uuid)
                .cloned();

            if let Some(write_characteristic) = write_characteristic {
                info!("Found write characteristic: {}", write_characteristic.uuid());
                return Ok(ResolvedChannel {
                    service_uuid: service.uuid(),
                    write_characteristic,
                    status_characteristic,
                });
            }
            warn!(
                "Configured write characteristic {} not present on service",
                config.write_characteristic_uuid
            );
        }

        if !config.discovery_fallback {
            for service in &services {
                info!("Available service: {}", service.uuid());
            }
            return Err(if configured_service.is_some() {
                PrintError::NoWritableCharacteristic.into()
            } else {
                PrintError::ServiceNotFound(config.service_uuid).into()
            });
        }

        info!("Falling back to enumerating advertised characteristics");
        let mut candidates = Vec::new();
        for service in &services {
            let service_uuid = service.uuid();
            for characteristic in service.characteristics().await? {
                let writable = match characteristic.properties().await {
                    Ok(props) => props.write || props.write_without_response,
                    Err(e) => {
                        warn!(
                            "Could not read properties of {}: {:#}",
                            characteristic.uuid(),
                            e
                        );
                        false
                    }
                };
                candidates.push(((service_uuid, characteristic), writable));
            }
        }

        let (service_uuid, write_characteristic) = select_first_writable(candidates)
            .ok_or(PrintError::NoWritableCharacteristic)?;
        info!(
            "Selected writable characteristic {} on service {}",
            write_characteristic.uuid(),
            service_uuid
        );

        Ok(ResolvedChannel {
            service_uuid,
            write_characteristic,
            status_characteristic: None,
        })
    }

    /// Disconnect from the device, tolerating an already-closed link.
    pub async fn disconnect(&self, device: &Device) -> Result<()> {
        if device.is_connected().await {
            info!("Disconnecting from device {}", device.id());
            self.adapter.disconnect_device(device).await?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", device.id());
        }
        Ok(())
    }
}

/// Picks the first candidate whose capability flags include write.
fn select_first_writable<T>(candidates: impl IntoIterator<Item = (T, bool)>) -> Option<T> {
    candidates
        .into_iter()
        .find(|(_, writable)| *writable)
        .map(|(candidate, _)| candidate)
}

/// Production [`PrinterLink`] over a bluest device handle.
pub struct BluestLink {
    connection: ConnectionManager,
    device: Device,
    config: PrinterConfig,
    channel: Option<ResolvedChannel>,
    events: EventSender,
}

impl BluestLink {
    pub fn new(
        connection: ConnectionManager,
        device: Device,
        config: PrinterConfig,
        events: EventSender,
    ) -> Self {
        Self {
            connection,
            device,
            config,
            channel: None,
            events,
        }
    }

    fn channel(&self) -> Result<&ResolvedChannel> {
        self.channel
            .as_ref()
            .context("channel used before resolution")
    }
}

#[async_trait::async_trait]
impl PrinterLink for BluestLink {
    async fn connect(&mut self) -> Result<()> {
        self.events.emit(PrinterEvent::Connecting {
            device_id: self.device.id().to_string(),
        });
        self.connection.connect(&self.device).await
    }

    async fn resolve_channel(&mut self) -> Result<()> {
        let channel = self
            .connection
            .resolve_channel(&self.device, &self.config)
            .await?;
        self.channel = Some(channel);
        Ok(())
    }

    async fn read_status(&mut self) -> Result<Option<Vec<u8>>> {
        match &self.channel()?.status_characteristic {
            Some(characteristic) => Ok(Some(characteristic.read().await?)),
            None => Ok(None),
        }
    }

    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.channel()?.write_characteristic.write(chunk).await?;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connection.disconnect(&self.device).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writable_candidate_is_selected() {
        let candidates = vec![("notify", false), ("write-a", true), ("write-b", true)];
        assert_eq!(select_first_writable(candidates), Some("write-a"));
    }

    #[test]
    fn no_writable_candidate_selects_nothing() {
        let candidates = vec![("notify", false), ("read", false)];
        assert_eq!(select_first_writable(candidates), None);
    }
}
