//! Service builder

use crate::service::FleetService;
use fleet_authorization::AuthorizationGuard;
use fleet_core::{
    ChangePublisher, DeviceDirectory, DeviceEvent, FleetConfig, GroupStore, Result,
};
use fleet_devices::{ChangeNotifier, DeviceLifecycle, SystemInfoService};
use fleet_effects::{ChannelPublisher, LogPublisher, MemoryDeviceDirectory, MemoryGroupStore};
use fleet_groups::GroupMembershipEngine;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// Builder for [`FleetService`]
///
/// Handlers that are not supplied default to the in-memory ones; the default
/// publisher only logs.
#[derive(Default)]
pub struct FleetServiceBuilder {
    config: FleetConfig,
    groups: Option<Arc<dyn GroupStore>>,
    devices: Option<Arc<dyn DeviceDirectory>>,
    publisher: Option<Arc<dyn ChangePublisher>>,
}

impl FleetServiceBuilder {
    /// Create a builder with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration
    pub fn with_config(mut self, config: FleetConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a specific group store
    pub fn with_group_store(mut self, groups: Arc<dyn GroupStore>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Use a specific device directory
    pub fn with_device_directory(mut self, devices: Arc<dyn DeviceDirectory>) -> Self {
        self.devices = Some(devices);
        self
    }

    /// Use a specific change publisher
    pub fn with_publisher(mut self, publisher: Arc<dyn ChangePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Build the service, validating the configuration first
    pub fn build(self) -> Result<FleetService> {
        self.config.validate()?;

        let groups = self
            .groups
            .unwrap_or_else(|| Arc::new(MemoryGroupStore::new()));
        let devices = self
            .devices
            .unwrap_or_else(|| Arc::new(MemoryDeviceDirectory::new()));
        let publisher = self.publisher.unwrap_or_else(|| Arc::new(LogPublisher));
        let policy = self.config.pagination.policy();

        let notifier = ChangeNotifier::new(publisher);
        let guard = AuthorizationGuard::new(groups.clone(), devices.clone());
        let engine = GroupMembershipEngine::new(groups.clone(), devices.clone(), policy);
        let system_info = SystemInfoService::new(devices.clone(), notifier.clone());
        let lifecycle = DeviceLifecycle::new(devices, groups, notifier);

        info!(
            default_limit = policy.default_limit,
            max_limit = policy.max_limit,
            "fleet service ready"
        );
        Ok(FleetService::from_parts(guard, engine, system_info, lifecycle))
    }

    /// Build the service with a channel publisher sized from the notifier
    /// configuration, returning the event receiver alongside it
    pub fn build_with_channel(mut self) -> Result<(FleetService, mpsc::Receiver<DeviceEvent>)> {
        self.config.validate()?;
        let (publisher, events) = ChannelPublisher::from_config(&self.config.notifier);
        self.publisher = Some(Arc::new(publisher));
        Ok((self.build()?, events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use fleet_core::FleetError;

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = FleetConfig::default();
        config.pagination.default_limit = 0;

        assert_matches!(
            FleetServiceBuilder::new().with_config(config).build(),
            Err(FleetError::Config { .. })
        );
    }

    #[test]
    fn test_defaults_build() {
        assert!(FleetServiceBuilder::new().build().is_ok());
    }
}
