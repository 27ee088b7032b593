//! Device directory effect

use crate::{AttributeSet, Device, DeviceUuid, Namespace, NetworkInfo, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Predicate over a device's attribute set, used for attribute-match queries
pub type AttributePredicate<'a> = &'a (dyn Fn(&AttributeSet) -> bool + Send + Sync);

/// Registry of devices and their reported attributes
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    /// Register a device.
    ///
    /// Fails with `DuplicateName` if the namespace already holds a device with
    /// the same external id.
    async fn insert_device(&self, device: Device) -> Result<()>;

    /// Fetch a device by uuid
    async fn get_device(&self, uuid: DeviceUuid) -> Result<Option<Device>>;

    /// Fetch several devices, preserving the order of `uuids` and skipping
    /// unknown ones
    async fn get_devices(&self, uuids: &[DeviceUuid]) -> Result<Vec<Device>>;

    /// Devices of a namespace whose attributes satisfy `predicate`, ordered
    /// by external id then uuid
    async fn find_devices(
        &self,
        namespace: &Namespace,
        predicate: AttributePredicate<'_>,
    ) -> Result<Vec<Device>>;

    /// Replace (or clear, with `None`) the system info document.
    ///
    /// Returns the previous document. Fails with `NotFound` for an unknown
    /// device.
    async fn set_system_info(
        &self,
        uuid: DeviceUuid,
        system_info: Option<Value>,
    ) -> Result<Option<Value>>;

    /// Replace the network identity. Fails with `NotFound` for an unknown device.
    async fn set_network_info(&self, uuid: DeviceUuid, network: NetworkInfo) -> Result<()>;

    /// Remove a device, returning it if it existed
    async fn remove_device(&self, uuid: DeviceUuid) -> Result<Option<Device>>;
}
