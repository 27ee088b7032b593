//! Ownership-chain authorization
//!
//! A request names a group or device in its path. The guard resolves the
//! namespace that owns it, then checks that namespace against the caller's
//! scope. Resolution reads current state on every call; nothing is cached
//! between requests.

use crate::{AccessDecision, AuthorizedScope, Permission};
use fleet_core::{
    DeviceDirectory, DeviceUuid, FleetError, GroupId, GroupStore, Namespace, Result,
};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Identifier taken from a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathTarget {
    /// A group id
    Group(GroupId),
    /// A device uuid
    Device(DeviceUuid),
}

impl fmt::Display for PathTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(id) => write!(f, "group {id}"),
            Self::Device(uuid) => write!(f, "device {uuid}"),
        }
    }
}

impl From<GroupId> for PathTarget {
    fn from(id: GroupId) -> Self {
        Self::Group(id)
    }
}

impl From<DeviceUuid> for PathTarget {
    fn from(uuid: DeviceUuid) -> Self {
        Self::Device(uuid)
    }
}

/// Resolves path identifiers to their owning namespace and checks caller scopes
#[derive(Clone)]
pub struct AuthorizationGuard {
    groups: Arc<dyn GroupStore>,
    devices: Arc<dyn DeviceDirectory>,
}

impl AuthorizationGuard {
    /// Create a guard over the given stores
    pub fn new(groups: Arc<dyn GroupStore>, devices: Arc<dyn DeviceDirectory>) -> Self {
        Self { groups, devices }
    }

    /// Namespace owning the target. Fails with `NotFound` if it does not exist.
    pub async fn resolve_namespace(&self, target: PathTarget) -> Result<Namespace> {
        match target {
            PathTarget::Group(id) => self
                .groups
                .get_group(id)
                .await?
                .map(|group| group.namespace)
                .ok_or_else(|| FleetError::not_found(format!("group {id}"))),
            PathTarget::Device(uuid) => self
                .devices
                .get_device(uuid)
                .await?
                .map(|device| device.namespace)
                .ok_or_else(|| FleetError::not_found(format!("device {uuid}"))),
        }
    }

    /// Resolve the target and require that `scope` may perform `permission` on it.
    ///
    /// Returns the owning namespace on success.
    pub async fn authorize(
        &self,
        scope: &AuthorizedScope,
        target: PathTarget,
        permission: Permission,
    ) -> Result<Namespace> {
        let owner = self.resolve_namespace(target).await?;
        check(scope, &owner, permission, &target.to_string())?;
        Ok(owner)
    }

    /// Authorize every target in order, stopping at the first failure
    pub async fn authorize_all(
        &self,
        scope: &AuthorizedScope,
        targets: &[PathTarget],
        permission: Permission,
    ) -> Result<()> {
        for target in targets {
            self.authorize(scope, *target, permission).await?;
        }
        Ok(())
    }

    /// Require `permission` within the caller's own namespace, for operations
    /// whose path names no group or device
    pub fn authorize_tenant(&self, scope: &AuthorizedScope, permission: Permission) -> Result<()> {
        check(scope, &scope.namespace, permission, "namespace")
    }
}

fn check(
    scope: &AuthorizedScope,
    owner: &Namespace,
    permission: Permission,
    what: &str,
) -> Result<()> {
    match AccessDecision::evaluate(scope, owner, permission) {
        AccessDecision::Allow => Ok(()),
        AccessDecision::Deny(reason) => {
            debug!(
                scope = %scope.namespace,
                owner = %owner,
                ?permission,
                target = what,
                "access denied"
            );
            Err(FleetError::forbidden(format!("{what}: {reason}")))
        }
    }
}
