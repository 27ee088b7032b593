//! Group membership engine
//!
//! Static groups read and write the stored membership relation. Dynamic
//! groups evaluate their expression against the device directory on every
//! read, so a device's membership follows its attributes without any stored
//! rows. Writes to a dynamic group's membership are rejected.

use crate::expression::Expression;
use crate::registry::{GroupDefinition, GroupRegistry};
use fleet_core::{
    AttributeSet, Device, DeviceDirectory, DeviceReference, DeviceUuid, FleetError, Group,
    GroupId, GroupKind, GroupStore, Namespace, Page, PagePolicy, PageRequest, Paginated, Result,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Membership queries and static membership writes
#[derive(Clone)]
pub struct GroupMembershipEngine {
    registry: GroupRegistry,
    groups: Arc<dyn GroupStore>,
    devices: Arc<dyn DeviceDirectory>,
    page_policy: PagePolicy,
}

impl GroupMembershipEngine {
    /// Create an engine over the group store and device directory
    pub fn new(
        groups: Arc<dyn GroupStore>,
        devices: Arc<dyn DeviceDirectory>,
        page_policy: PagePolicy,
    ) -> Self {
        Self {
            registry: GroupRegistry::new(groups.clone(), page_policy),
            groups,
            devices,
            page_policy,
        }
    }

    /// Registry sharing this engine's store
    pub fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    /// Register a group. See [`GroupRegistry::create`].
    pub async fn create(&self, namespace: Namespace, definition: GroupDefinition) -> Result<GroupId> {
        self.registry.create(namespace, definition).await
    }

    /// Members of a group, paginated.
    ///
    /// Static members come back in insertion order; dynamic members are
    /// ordered by external id, then uuid.
    pub async fn list_devices(
        &self,
        id: GroupId,
        page: PageRequest,
    ) -> Result<Paginated<DeviceReference>> {
        let group = self.registry.get(id).await?;
        let page = page.resolve(&self.page_policy);

        match &group.kind {
            GroupKind::Static => {
                let members = self.live_static_members(id).await?;
                Ok(Paginated::from_ordered(
                    members.iter().map(Device::reference).collect(),
                    page,
                ))
            }
            GroupKind::Dynamic { expression } => {
                let expression = stored_expression(&group, expression)?;
                let matched = self.matching_devices(&group.namespace, &expression).await?;
                debug!(group = %id, matched = matched.len(), "evaluated dynamic group");
                Ok(Paginated::from_ordered(
                    matched.iter().map(Device::reference).collect(),
                    page,
                ))
            }
        }
    }

    /// Number of members a full listing would return
    pub async fn count_devices(&self, id: GroupId) -> Result<u64> {
        let group = self.registry.get(id).await?;
        match &group.kind {
            GroupKind::Static => Ok(self.live_static_members(id).await?.len() as u64),
            GroupKind::Dynamic { expression } => {
                let expression = stored_expression(&group, expression)?;
                let matched = self.matching_devices(&group.namespace, &expression).await?;
                Ok(matched.len() as u64)
            }
        }
    }

    /// Add a device to a static group. Adding an existing member is a no-op.
    pub async fn add_group_member(&self, id: GroupId, device: DeviceUuid) -> Result<()> {
        let group = self.static_target(id, device).await?;
        if self.groups.add_member(id, device).await? {
            // device may have been decommissioned between the check and the insert
            if self.devices.get_device(device).await?.is_none() {
                self.groups.remove_member(id, device).await?;
                return Err(FleetError::not_found(format!("device {device}")));
            }
            info!(group = %id, namespace = %group.namespace, %device, "added group member");
        } else {
            debug!(group = %id, %device, "device already a member");
        }
        Ok(())
    }

    /// Remove a device from a static group. Removing a non-member is a no-op.
    pub async fn remove_group_member(&self, id: GroupId, device: DeviceUuid) -> Result<()> {
        let group = self.static_target(id, device).await?;
        if self.groups.remove_member(id, device).await? {
            info!(group = %id, namespace = %group.namespace, %device, "removed group member");
        } else {
            debug!(group = %id, %device, "device was not a member");
        }
        Ok(())
    }

    /// Every group of the device's namespace that currently contains it,
    /// ordered by group name
    pub async fn groups_for_device(&self, uuid: DeviceUuid) -> Result<Vec<Group>> {
        let device = self
            .devices
            .get_device(uuid)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("device {uuid}")))?;

        let static_ids: HashSet<GroupId> =
            self.groups.groups_with_member(uuid).await?.into_iter().collect();
        let attributes = device.attributes();
        let candidates = self.groups.list_groups(&device.namespace, Page::ALL).await?;

        let mut groups = Vec::new();
        for group in candidates.values {
            let member = match &group.kind {
                GroupKind::Static => static_ids.contains(&group.id),
                GroupKind::Dynamic { expression } => {
                    stored_expression(&group, expression)?.matches(&attributes)
                }
            };
            if member {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    // Group must exist and be static, device must exist in the group's namespace.
    async fn static_target(&self, id: GroupId, device: DeviceUuid) -> Result<Group> {
        let group = self.registry.get(id).await?;
        let record = self
            .devices
            .get_device(device)
            .await?
            .ok_or_else(|| FleetError::not_found(format!("device {device}")))?;

        if let GroupKind::Dynamic { .. } = group.kind {
            return Err(FleetError::group_type_mismatch(format!(
                "group {id} is dynamic; its members follow its expression"
            )));
        }
        if record.namespace != group.namespace {
            return Err(FleetError::forbidden(format!(
                "device {device} belongs to a different namespace than group {id}"
            )));
        }
        Ok(group)
    }

    // Stored rows joined with the directory, in insertion order. Rows whose
    // device is gone are dropped from the result and deleted.
    async fn live_static_members(&self, id: GroupId) -> Result<Vec<Device>> {
        let rows = self.groups.list_members(id, Page::ALL).await?;
        let devices = self.devices.get_devices(&rows.values).await?;
        if devices.len() != rows.values.len() {
            let live: HashSet<DeviceUuid> = devices.iter().map(|d| d.uuid).collect();
            warn!(
                group = %id,
                missing = rows.values.len().saturating_sub(devices.len()),
                "static membership references unknown devices"
            );
            for uuid in rows.values.iter().filter(|uuid| !live.contains(uuid)) {
                self.groups.remove_member(id, *uuid).await?;
            }
        }
        Ok(devices)
    }

    async fn matching_devices(
        &self,
        namespace: &Namespace,
        expression: &Expression,
    ) -> Result<Vec<Device>> {
        let predicate = |attrs: &AttributeSet| expression.matches(attrs);
        self.devices.find_devices(namespace, &predicate).await
    }
}

// Expressions are validated on create, so stored text that no longer parses
// is corrupted state rather than caller error.
fn stored_expression(group: &Group, text: &str) -> Result<Expression> {
    Expression::parse(text).map_err(|err| {
        FleetError::internal(format!(
            "stored expression of group {} does not parse: {err}",
            group.id
        ))
    })
}
