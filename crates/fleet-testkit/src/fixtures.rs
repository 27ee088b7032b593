//! Wired service fixtures

use crate::builders::DeviceBuilder;
use crate::publishers::RecordingPublisher;
use fleet_authorization::{AuthorizedScope, PermissionLevel};
use fleet_core::{ChangePublisher, Device, DeviceDirectory, DeviceUuid, FleetConfig, Namespace};
use fleet_effects::{MemoryDeviceDirectory, MemoryGroupStore};
use fleet_service::{FleetService, FleetServiceBuilder};
use std::sync::Arc;

/// Scope for `namespace` at `level`
pub fn scope_for(namespace: &str, level: PermissionLevel) -> AuthorizedScope {
    AuthorizedScope::new(Namespace::new(namespace).unwrap(), level)
}

/// A [`FleetService`] over in-memory handlers, with direct access to them
pub struct TestFleet {
    /// Service under test
    pub service: FleetService,
    /// Group store behind the service
    pub groups: Arc<MemoryGroupStore>,
    /// Device directory behind the service
    pub devices: Arc<MemoryDeviceDirectory>,
    /// Events published by the service
    pub events: RecordingPublisher,
}

impl TestFleet {
    /// Default configuration, recording publisher
    pub fn new() -> Self {
        Self::with_config(FleetConfig::default())
    }

    /// Custom configuration, recording publisher
    pub fn with_config(config: FleetConfig) -> Self {
        let events = RecordingPublisher::new();
        Self::build(config, Arc::new(events.clone()), events)
    }

    /// Default configuration, custom publisher. `events` stays empty.
    pub fn with_publisher(publisher: Arc<dyn ChangePublisher>) -> Self {
        Self::build(FleetConfig::default(), publisher, RecordingPublisher::new())
    }

    fn build(
        config: FleetConfig,
        publisher: Arc<dyn ChangePublisher>,
        events: RecordingPublisher,
    ) -> Self {
        let groups = Arc::new(MemoryGroupStore::new());
        let devices = Arc::new(MemoryDeviceDirectory::new());
        let service = FleetServiceBuilder::new()
            .with_config(config)
            .with_group_store(groups.clone())
            .with_device_directory(devices.clone())
            .with_publisher(publisher)
            .build()
            .unwrap();
        Self {
            service,
            groups,
            devices,
            events,
        }
    }

    /// Read-write scope for `namespace`
    pub fn writer(&self, namespace: &str) -> AuthorizedScope {
        scope_for(namespace, PermissionLevel::ReadWrite)
    }

    /// Read-only scope for `namespace`
    pub fn reader(&self, namespace: &str) -> AuthorizedScope {
        scope_for(namespace, PermissionLevel::Read)
    }

    /// Insert a device straight into the directory, bypassing the service
    pub async fn seed(&self, builder: DeviceBuilder) -> DeviceUuid {
        let device: Device = builder.build();
        let uuid = device.uuid;
        self.devices.insert_device(device).await.unwrap();
        uuid
    }
}

impl Default for TestFleet {
    fn default() -> Self {
        Self::new()
    }
}
