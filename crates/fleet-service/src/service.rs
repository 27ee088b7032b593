//! Operation facade
//!
//! Every operation authorizes first and only then touches the registry, the
//! membership engine or the device services. Identifiers named in a request
//! path are resolved to their owning namespace by the guard; operations with
//! no path identifier are checked against the caller's own namespace.
//!
//! State-changing operations run detached; reads run on the caller's task.

use crate::detached::run_detached;
use crate::listing::{DeviceEntry, ListingShape};
use fleet_authorization::{AuthorizationGuard, AuthorizedScope, PathTarget, Permission};
use fleet_core::{
    Device, DeviceId, DeviceUuid, Group, GroupId, GroupName, PageRequest, Paginated, Result,
};
use fleet_devices::{DeviceLifecycle, SystemInfoService, UpsertOutcome};
use fleet_groups::{Expression, GroupDefinition, GroupMembershipEngine};
use serde_json::Value;
use tracing::instrument;

/// Authorized entry point for every group and device operation
#[derive(Clone)]
pub struct FleetService {
    guard: AuthorizationGuard,
    engine: GroupMembershipEngine,
    system_info: SystemInfoService,
    lifecycle: DeviceLifecycle,
}

impl std::fmt::Debug for FleetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetService").finish_non_exhaustive()
    }
}

impl FleetService {
    pub(crate) fn from_parts(
        guard: AuthorizationGuard,
        engine: GroupMembershipEngine,
        system_info: SystemInfoService,
        lifecycle: DeviceLifecycle,
    ) -> Self {
        Self {
            guard,
            engine,
            system_info,
            lifecycle,
        }
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    /// Create a group in the caller's namespace
    #[instrument(skip(self, scope, definition), fields(namespace = %scope.namespace, name = %definition.name))]
    pub async fn create_group(
        &self,
        scope: &AuthorizedScope,
        definition: GroupDefinition,
    ) -> Result<GroupId> {
        self.guard.authorize_tenant(scope, Permission::Write)?;
        let engine = self.engine.clone();
        let namespace = scope.namespace.clone();
        run_detached("create_group", async move { engine.create(namespace, definition).await })
            .await
    }

    /// Groups of the caller's namespace, ordered by name
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn list_groups(
        &self,
        scope: &AuthorizedScope,
        page: PageRequest,
    ) -> Result<Paginated<Group>> {
        self.guard.authorize_tenant(scope, Permission::Read)?;
        self.engine.registry().list(&scope.namespace, page).await
    }

    /// Fetch one group
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn get_group(&self, scope: &AuthorizedScope, id: GroupId) -> Result<Group> {
        self.guard.authorize(scope, id.into(), Permission::Read).await?;
        self.engine.registry().get(id).await
    }

    /// Rename a group
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn rename_group(
        &self,
        scope: &AuthorizedScope,
        id: GroupId,
        name: GroupName,
    ) -> Result<Group> {
        self.guard.authorize(scope, id.into(), Permission::Write).await?;
        let engine = self.engine.clone();
        run_detached("rename_group", async move { engine.registry().rename(id, name).await })
            .await
    }

    /// Number of devices in a group
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn count_devices(&self, scope: &AuthorizedScope, id: GroupId) -> Result<u64> {
        self.guard.authorize(scope, id.into(), Permission::Read).await?;
        self.engine.count_devices(id).await
    }

    /// Devices in a group, paginated, in the requested shape
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn list_devices(
        &self,
        scope: &AuthorizedScope,
        id: GroupId,
        page: PageRequest,
        shape: ListingShape,
    ) -> Result<Paginated<DeviceEntry>> {
        self.guard.authorize(scope, id.into(), Permission::Read).await?;
        let listed = self.engine.list_devices(id, page).await?;
        Ok(listed.map(|reference| DeviceEntry::shaped(reference, shape)))
    }

    /// Add a device to a static group. Both must belong to the caller.
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn add_device_to_group(
        &self,
        scope: &AuthorizedScope,
        group: GroupId,
        device: DeviceUuid,
    ) -> Result<()> {
        self.authorize_pair(scope, group, device).await?;
        let engine = self.engine.clone();
        run_detached("add_device_to_group", async move {
            engine.add_group_member(group, device).await
        })
        .await
    }

    /// Remove a device from a static group. Both must belong to the caller.
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn remove_device_from_group(
        &self,
        scope: &AuthorizedScope,
        group: GroupId,
        device: DeviceUuid,
    ) -> Result<()> {
        self.authorize_pair(scope, group, device).await?;
        let engine = self.engine.clone();
        run_detached("remove_device_from_group", async move {
            engine.remove_group_member(group, device).await
        })
        .await
    }

    /// Parse an expression without creating anything
    #[instrument(skip(self, scope, text), fields(namespace = %scope.namespace))]
    pub fn validate_expression(&self, scope: &AuthorizedScope, text: &str) -> Result<Expression> {
        self.guard.authorize_tenant(scope, Permission::Read)?;
        self.engine.registry().validate_expression(text)
    }

    // ------------------------------------------------------------------
    // Devices
    // ------------------------------------------------------------------

    /// Register a device in the caller's namespace
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn register_device(
        &self,
        scope: &AuthorizedScope,
        device_id: DeviceId,
    ) -> Result<Device> {
        self.guard.authorize_tenant(scope, Permission::Write)?;
        let lifecycle = self.lifecycle.clone();
        let namespace = scope.namespace.clone();
        run_detached("register_device", async move {
            lifecycle.register(namespace, device_id).await
        })
        .await
    }

    /// Remove a device and its static memberships
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn decommission_device(
        &self,
        scope: &AuthorizedScope,
        device: DeviceUuid,
    ) -> Result<Device> {
        self.guard
            .authorize(scope, device.into(), Permission::Write)
            .await?;
        let lifecycle = self.lifecycle.clone();
        run_detached("decommission_device", async move {
            lifecycle.decommission(device).await
        })
        .await
    }

    /// Groups currently containing a device
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn groups_for_device(
        &self,
        scope: &AuthorizedScope,
        device: DeviceUuid,
    ) -> Result<Vec<Group>> {
        self.guard
            .authorize(scope, device.into(), Permission::Read)
            .await?;
        self.engine.groups_for_device(device).await
    }

    /// Recorded system info, `{}` when none was reported
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn get_system_info(&self, scope: &AuthorizedScope, device: DeviceUuid) -> Result<Value> {
        self.guard
            .authorize(scope, device.into(), Permission::Read)
            .await?;
        self.system_info.get(device).await
    }

    /// Store a raw JSON system info document
    #[instrument(skip(self, scope, raw), fields(namespace = %scope.namespace))]
    pub async fn upsert_system_info(
        &self,
        scope: &AuthorizedScope,
        device: DeviceUuid,
        raw: &str,
    ) -> Result<UpsertOutcome> {
        self.guard
            .authorize(scope, device.into(), Permission::Write)
            .await?;
        let system_info = self.system_info.clone();
        let raw = raw.to_owned();
        run_detached("upsert_system_info", async move {
            system_info.upsert_raw(device, &raw).await
        })
        .await
    }

    /// Clear a device's system info
    #[instrument(skip(self, scope), fields(namespace = %scope.namespace))]
    pub async fn delete_system_info(&self, scope: &AuthorizedScope, device: DeviceUuid) -> Result<()> {
        self.guard
            .authorize(scope, device.into(), Permission::Write)
            .await?;
        let system_info = self.system_info.clone();
        run_detached("delete_system_info", async move {
            system_info.delete(device).await
        })
        .await
    }

    /// Store a raw JSON network identity. Fails if the update notification
    /// cannot be published.
    #[instrument(skip(self, scope, raw), fields(namespace = %scope.namespace))]
    pub async fn set_network_info(
        &self,
        scope: &AuthorizedScope,
        device: DeviceUuid,
        raw: &str,
    ) -> Result<()> {
        self.guard
            .authorize(scope, device.into(), Permission::Write)
            .await?;
        let system_info = self.system_info.clone();
        let raw = raw.to_owned();
        run_detached("set_network_info", async move {
            system_info.set_network_raw(device, &raw).await
        })
        .await
    }

    async fn authorize_pair(
        &self,
        scope: &AuthorizedScope,
        group: GroupId,
        device: DeviceUuid,
    ) -> Result<()> {
        let targets = [PathTarget::Group(group), PathTarget::Device(device)];
        self.guard
            .authorize_all(scope, &targets, Permission::Write)
            .await
    }
}
