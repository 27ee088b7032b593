//! In-memory device directory handler

use async_trait::async_trait;
use fleet_core::{
    AttributePredicate, Device, DeviceDirectory, DeviceId, DeviceUuid, FleetError, Namespace,
    NetworkInfo, Result,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct DeviceTables {
    devices: HashMap<DeviceUuid, Device>,
    // (namespace, external id) unique index
    external_ids: HashMap<(Namespace, DeviceId), DeviceUuid>,
}

/// In-memory device directory handler
#[derive(Clone, Default)]
pub struct MemoryDeviceDirectory {
    tables: Arc<RwLock<DeviceTables>>,
}

impl MemoryDeviceDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(uuid: DeviceUuid) -> FleetError {
    FleetError::not_found(format!("device {uuid}"))
}

#[async_trait]
impl DeviceDirectory for MemoryDeviceDirectory {
    async fn insert_device(&self, device: Device) -> Result<()> {
        let mut tables = self.tables.write().await;
        let key = (device.namespace.clone(), device.device_id.clone());
        if tables.external_ids.contains_key(&key) {
            return Err(FleetError::duplicate_name(
                device.namespace.as_str(),
                device.device_id.as_str(),
            ));
        }
        tables.external_ids.insert(key, device.uuid);
        tables.devices.insert(device.uuid, device);
        Ok(())
    }

    async fn get_device(&self, uuid: DeviceUuid) -> Result<Option<Device>> {
        let tables = self.tables.read().await;
        Ok(tables.devices.get(&uuid).cloned())
    }

    async fn get_devices(&self, uuids: &[DeviceUuid]) -> Result<Vec<Device>> {
        let tables = self.tables.read().await;
        Ok(uuids
            .iter()
            .filter_map(|uuid| tables.devices.get(uuid).cloned())
            .collect())
    }

    async fn find_devices(
        &self,
        namespace: &Namespace,
        predicate: AttributePredicate<'_>,
    ) -> Result<Vec<Device>> {
        let tables = self.tables.read().await;
        let mut matched: Vec<Device> = tables
            .devices
            .values()
            .filter(|d| &d.namespace == namespace && predicate(&d.attributes()))
            .cloned()
            .collect();
        matched.sort_by(|a, b| (&a.device_id, a.uuid).cmp(&(&b.device_id, b.uuid)));
        Ok(matched)
    }

    async fn set_system_info(
        &self,
        uuid: DeviceUuid,
        system_info: Option<Value>,
    ) -> Result<Option<Value>> {
        let mut tables = self.tables.write().await;
        let device = tables.devices.get_mut(&uuid).ok_or_else(|| missing(uuid))?;
        Ok(std::mem::replace(&mut device.system_info, system_info))
    }

    async fn set_network_info(&self, uuid: DeviceUuid, network: NetworkInfo) -> Result<()> {
        let mut tables = self.tables.write().await;
        let device = tables.devices.get_mut(&uuid).ok_or_else(|| missing(uuid))?;
        device.network = Some(network);
        Ok(())
    }

    async fn remove_device(&self, uuid: DeviceUuid) -> Result<Option<Device>> {
        let mut tables = self.tables.write().await;
        let removed = tables.devices.remove(&uuid);
        if let Some(device) = &removed {
            tables
                .external_ids
                .remove(&(device.namespace.clone(), device.device_id.clone()));
        }
        Ok(removed)
    }
}
