//! Group store effect
//!
//! Persistence for group records and the static membership relation. Each
//! call is one atomic step: uniqueness checks happen inside the same critical
//! section as the write they guard.

use crate::{DeviceUuid, Group, GroupId, GroupName, Namespace, Page, Paginated, Result};
use async_trait::async_trait;

/// Persistence for groups and static memberships
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Persist a new group.
    ///
    /// Fails with `DuplicateName` if the namespace already holds a group with
    /// the same name.
    async fn insert_group(&self, group: Group) -> Result<()>;

    /// Fetch a group by id
    async fn get_group(&self, id: GroupId) -> Result<Option<Group>>;

    /// Groups of a namespace ordered by name
    async fn list_groups(&self, namespace: &Namespace, page: Page) -> Result<Paginated<Group>>;

    /// Rename in place, returning the updated record.
    ///
    /// Fails with `NotFound` for an unknown id and `DuplicateName` if another
    /// group of the same namespace holds `name`. Renaming a group to its
    /// current name succeeds.
    async fn rename_group(&self, id: GroupId, name: GroupName) -> Result<Group>;

    /// Insert a static membership row. Returns `false` if it already existed.
    async fn add_member(&self, id: GroupId, device: DeviceUuid) -> Result<bool>;

    /// Delete a static membership row. Returns `false` if it did not exist.
    async fn remove_member(&self, id: GroupId, device: DeviceUuid) -> Result<bool>;

    /// Static members of a group in insertion order
    async fn list_members(&self, id: GroupId, page: Page) -> Result<Paginated<DeviceUuid>>;

    /// Number of static members of a group
    async fn count_members(&self, id: GroupId) -> Result<u64>;

    /// Groups holding a static membership row for the device
    async fn groups_with_member(&self, device: DeviceUuid) -> Result<Vec<GroupId>>;

    /// Drop every membership row of a device. Returns the number removed.
    async fn purge_device(&self, device: DeviceUuid) -> Result<u64>;
}
