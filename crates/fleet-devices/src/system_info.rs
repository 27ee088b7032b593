//! System info and network identity documents
//!
//! Writes go to the device directory first; the change notifier runs only
//! after the write returned successfully.

use crate::notifier::ChangeNotifier;
use fleet_core::{Device, DeviceDirectory, DeviceUuid, FleetError, NetworkInfo, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Whether an upsert created the document or replaced an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    /// No document was recorded before
    Created,
    /// An existing document was replaced
    Updated,
}

impl UpsertOutcome {
    /// 201 for a new document, 200 for a replacement
    pub fn status_code(self) -> u16 {
        match self {
            Self::Created => 201,
            Self::Updated => 200,
        }
    }
}

/// Reads and writes a device's reported documents
#[derive(Clone)]
pub struct SystemInfoService {
    devices: Arc<dyn DeviceDirectory>,
    notifier: ChangeNotifier,
}

impl SystemInfoService {
    /// Create a service over the directory and notifier
    pub fn new(devices: Arc<dyn DeviceDirectory>, notifier: ChangeNotifier) -> Self {
        Self { devices, notifier }
    }

    /// Recorded system info, or an empty object if none was reported
    pub async fn get(&self, uuid: DeviceUuid) -> Result<Value> {
        let device = self.device(uuid).await?;
        Ok(device
            .system_info
            .unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Parse `raw` as JSON and store it. See [`SystemInfoService::upsert`].
    pub async fn upsert_raw(&self, uuid: DeviceUuid, raw: &str) -> Result<UpsertOutcome> {
        let document: Value = serde_json::from_str(raw)?;
        self.upsert(uuid, document).await
    }

    /// Replace the system info document, then safe-publish the change.
    ///
    /// The document must be a JSON object.
    pub async fn upsert(&self, uuid: DeviceUuid, document: Value) -> Result<UpsertOutcome> {
        if !document.is_object() {
            return Err(FleetError::malformed_payload(
                "system info must be a JSON object",
            ));
        }
        let device = self.device(uuid).await?;

        let previous = self
            .devices
            .set_system_info(uuid, Some(document.clone()))
            .await?;
        let outcome = match previous {
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Created,
        };
        info!(%uuid, namespace = %device.namespace, ?outcome, "stored system info");

        self.notifier
            .publish_safe(device.namespace, uuid, Some(document))
            .await;
        Ok(outcome)
    }

    /// Clear the system info document, then safe-publish the removal.
    ///
    /// Clearing a device with no document is a no-op and publishes nothing.
    pub async fn delete(&self, uuid: DeviceUuid) -> Result<()> {
        let device = self.device(uuid).await?;
        let previous = self.devices.set_system_info(uuid, None).await?;
        if previous.is_none() {
            debug!(%uuid, "no system info to clear");
            return Ok(());
        }
        info!(%uuid, namespace = %device.namespace, "cleared system info");
        self.notifier.publish_safe(device.namespace, uuid, None).await;
        Ok(())
    }

    /// Parse `raw` as a network identity and store it. See
    /// [`SystemInfoService::set_network`].
    pub async fn set_network_raw(&self, uuid: DeviceUuid, raw: &str) -> Result<()> {
        let network: NetworkInfo = serde_json::from_str(raw)?;
        self.set_network(uuid, network).await
    }

    /// Replace the network identity, then publish the update.
    ///
    /// A publish failure fails the call although the identity is already stored;
    /// repeating the call is safe.
    pub async fn set_network(&self, uuid: DeviceUuid, network: NetworkInfo) -> Result<()> {
        let device = self.device(uuid).await?;
        self.devices.set_network_info(uuid, network.clone()).await?;
        info!(%uuid, namespace = %device.namespace, hostname = %network.hostname, "stored network info");

        self.notifier
            .publish_network_update(device.namespace, uuid, network)
            .await
    }

    async fn device(&self, uuid: DeviceUuid) -> Result<Device> {
        self.devices
            .get_device(uuid)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("device {uuid}")))
    }
}
