//! In-memory group store handler

use async_trait::async_trait;
use fleet_core::{
    DeviceUuid, FleetError, Group, GroupId, GroupName, GroupStore, Namespace, Page, Paginated,
    Result,
};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct GroupTables {
    groups: HashMap<GroupId, Group>,
    // (namespace, name) unique index
    names: HashMap<(Namespace, GroupName), GroupId>,
    // static membership rows, in insertion order
    members: HashMap<GroupId, IndexSet<DeviceUuid>>,
}

/// In-memory group store handler
#[derive(Clone, Default)]
pub struct MemoryGroupStore {
    tables: Arc<RwLock<GroupTables>>,
}

impl MemoryGroupStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(id: GroupId) -> FleetError {
    FleetError::not_found(format!("group {id}"))
}

#[async_trait]
impl GroupStore for MemoryGroupStore {
    async fn insert_group(&self, group: Group) -> Result<()> {
        let mut tables = self.tables.write().await;
        let key = (group.namespace.clone(), group.name.clone());
        if tables.names.contains_key(&key) {
            return Err(FleetError::duplicate_name(
                group.namespace.as_str(),
                group.name.as_str(),
            ));
        }
        tables.names.insert(key, group.id);
        tables.members.insert(group.id, IndexSet::new());
        tables.groups.insert(group.id, group);
        Ok(())
    }

    async fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.get(&id).cloned())
    }

    async fn list_groups(&self, namespace: &Namespace, page: Page) -> Result<Paginated<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables
            .groups
            .values()
            .filter(|g| &g.namespace == namespace)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Paginated::from_ordered(groups, page))
    }

    async fn rename_group(&self, id: GroupId, name: GroupName) -> Result<Group> {
        let mut tables = self.tables.write().await;
        let (namespace, current) = match tables.groups.get(&id) {
            Some(group) => (group.namespace.clone(), group.name.clone()),
            None => return Err(missing(id)),
        };
        if current == name {
            return tables.groups.get(&id).cloned().ok_or_else(|| missing(id));
        }

        let new_key = (namespace.clone(), name.clone());
        if tables.names.contains_key(&new_key) {
            return Err(FleetError::duplicate_name(namespace.as_str(), name.as_str()));
        }
        tables.names.remove(&(namespace, current));
        tables.names.insert(new_key, id);

        let group = tables.groups.get_mut(&id).ok_or_else(|| missing(id))?;
        group.name = name;
        Ok(group.clone())
    }

    async fn add_member(&self, id: GroupId, device: DeviceUuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let members = tables.members.get_mut(&id).ok_or_else(|| missing(id))?;
        Ok(members.insert(device))
    }

    async fn remove_member(&self, id: GroupId, device: DeviceUuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let members = tables.members.get_mut(&id).ok_or_else(|| missing(id))?;
        Ok(members.shift_remove(&device))
    }

    async fn list_members(&self, id: GroupId, page: Page) -> Result<Paginated<DeviceUuid>> {
        let tables = self.tables.read().await;
        let members = tables.members.get(&id).ok_or_else(|| missing(id))?;
        Ok(Paginated::from_ordered(
            members.iter().copied().collect(),
            page,
        ))
    }

    async fn count_members(&self, id: GroupId) -> Result<u64> {
        let tables = self.tables.read().await;
        let members = tables.members.get(&id).ok_or_else(|| missing(id))?;
        Ok(members.len() as u64)
    }

    async fn groups_with_member(&self, device: DeviceUuid) -> Result<Vec<GroupId>> {
        let tables = self.tables.read().await;
        let mut ids: Vec<GroupId> = tables
            .members
            .iter()
            .filter(|(_, members)| members.contains(&device))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn purge_device(&self, device: DeviceUuid) -> Result<u64> {
        let mut tables = self.tables.write().await;
        let removed = tables
            .members
            .values_mut()
            .filter_map(|members| members.shift_remove(&device).then_some(()))
            .count();
        Ok(removed as u64)
    }
}
