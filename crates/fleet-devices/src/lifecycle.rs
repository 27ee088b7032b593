//! Device registration and decommissioning

use crate::notifier::ChangeNotifier;
use fleet_core::{
    Device, DeviceDirectory, DeviceId, DeviceUuid, FleetError, GroupStore, Namespace, Result,
};
use std::sync::Arc;
use tracing::info;

/// Adds devices to and removes them from the directory
#[derive(Clone)]
pub struct DeviceLifecycle {
    devices: Arc<dyn DeviceDirectory>,
    groups: Arc<dyn GroupStore>,
    notifier: ChangeNotifier,
}

impl DeviceLifecycle {
    /// Create a lifecycle manager
    pub fn new(
        devices: Arc<dyn DeviceDirectory>,
        groups: Arc<dyn GroupStore>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            devices,
            groups,
            notifier,
        }
    }

    /// Register a device under its external id.
    ///
    /// Fails with `DuplicateName` if the namespace already has that external id.
    pub async fn register(&self, namespace: Namespace, device_id: DeviceId) -> Result<Device> {
        let device = Device::new(namespace, device_id);
        self.devices.insert_device(device.clone()).await?;
        info!(
            uuid = %device.uuid,
            namespace = %device.namespace,
            device_id = %device.device_id,
            "registered device"
        );
        Ok(device)
    }

    /// Remove a device and every static membership row that references it
    pub async fn decommission(&self, uuid: DeviceUuid) -> Result<Device> {
        let device = self
            .devices
            .remove_device(uuid)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("device {uuid}")))?;
        let purged = self.groups.purge_device(uuid).await?;
        info!(%uuid, namespace = %device.namespace, purged, "decommissioned device");

        self.notifier
            .publish_decommissioned(device.namespace.clone(), uuid)
            .await;
        Ok(device)
    }
}
