//! Registration and decommissioning against the in-memory handlers

use assert_matches::assert_matches;
use fleet_core::{
    DeviceDirectory, DeviceEvent, DeviceId, FleetError, Group, GroupName, GroupStore, Namespace,
    Page,
};
use fleet_devices::{ChangeNotifier, DeviceLifecycle};
use fleet_effects::{ChannelPublisher, MemoryDeviceDirectory, MemoryGroupStore};
use std::sync::Arc;
use std::time::Duration;

fn ns(name: &str) -> Namespace {
    Namespace::new(name).unwrap()
}

fn device_id(value: &str) -> DeviceId {
    DeviceId::new(value).unwrap()
}

#[tokio::test]
async fn duplicate_external_id_is_rejected_per_namespace() {
    let (publisher, _rx) = ChannelPublisher::new(8, Duration::from_millis(50));
    let lifecycle = DeviceLifecycle::new(
        Arc::new(MemoryDeviceDirectory::new()),
        Arc::new(MemoryGroupStore::new()),
        ChangeNotifier::new(Arc::new(publisher)),
    );

    lifecycle.register(ns("a"), device_id("vin-1")).await.unwrap();
    assert_matches!(
        lifecycle.register(ns("a"), device_id("vin-1")).await,
        Err(FleetError::DuplicateName { .. })
    );
    lifecycle.register(ns("b"), device_id("vin-1")).await.unwrap();
}

#[tokio::test]
async fn decommission_purges_static_memberships() {
    let devices = Arc::new(MemoryDeviceDirectory::new());
    let groups = Arc::new(MemoryGroupStore::new());
    let (publisher, mut rx) = ChannelPublisher::new(8, Duration::from_millis(50));
    let lifecycle = DeviceLifecycle::new(
        devices.clone(),
        groups.clone(),
        ChangeNotifier::new(Arc::new(publisher)),
    );

    let group = Group::new_static(ns("a"), GroupName::new("fixed").unwrap());
    let group_id = group.id;
    groups.insert_group(group).await.unwrap();

    let device = lifecycle.register(ns("a"), device_id("vin-1")).await.unwrap();
    groups.add_member(group_id, device.uuid).await.unwrap();

    lifecycle.decommission(device.uuid).await.unwrap();

    assert!(devices.get_device(device.uuid).await.unwrap().is_none());
    assert_eq!(groups.count_members(group_id).await.unwrap(), 0);
    assert!(groups
        .list_members(group_id, Page::ALL)
        .await
        .unwrap()
        .values
        .is_empty());
    assert_matches!(
        rx.recv().await,
        Some(DeviceEvent::DeviceDecommissioned { .. })
    );

    assert_matches!(
        lifecycle.decommission(device.uuid).await,
        Err(FleetError::NotFound { .. })
    );
}

#[tokio::test]
async fn decommission_survives_closed_channel() {
    let (publisher, rx) = ChannelPublisher::new(8, Duration::from_millis(50));
    drop(rx);
    let lifecycle = DeviceLifecycle::new(
        Arc::new(MemoryDeviceDirectory::new()),
        Arc::new(MemoryGroupStore::new()),
        ChangeNotifier::new(Arc::new(publisher)),
    );

    let device = lifecycle.register(ns("a"), device_id("vin-1")).await.unwrap();
    lifecycle.decommission(device.uuid).await.unwrap();
}
