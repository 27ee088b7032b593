//! Ownership-chain resolution against live handlers

use assert_matches::assert_matches;
use fleet_authorization::{AuthorizationGuard, AuthorizedScope, PathTarget, Permission};
use fleet_core::{
    Device, DeviceDirectory, DeviceId, DeviceUuid, FleetError, Group, GroupId, GroupName,
    GroupStore, Namespace,
};
use fleet_effects::{MemoryDeviceDirectory, MemoryGroupStore};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn ns(name: &str) -> Namespace {
    Namespace::new(name).unwrap()
}

struct Fixture {
    guard: AuthorizationGuard,
    groups: Arc<MemoryGroupStore>,
    devices: Arc<MemoryDeviceDirectory>,
}

fn fixture() -> Fixture {
    let groups = Arc::new(MemoryGroupStore::new());
    let devices = Arc::new(MemoryDeviceDirectory::new());
    let guard = AuthorizationGuard::new(groups.clone(), devices.clone());
    Fixture {
        guard,
        groups,
        devices,
    }
}

async fn group_in(fx: &Fixture, namespace: &str) -> GroupId {
    let group = Group::new_static(ns(namespace), GroupName::new("g").unwrap());
    let id = group.id;
    fx.groups.insert_group(group).await.unwrap();
    id
}

async fn device_in(fx: &Fixture, namespace: &str) -> DeviceUuid {
    let device = Device::new(ns(namespace), DeviceId::new("d").unwrap());
    let uuid = device.uuid;
    fx.devices.insert_device(device).await.unwrap();
    uuid
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn resolves_group_and_device_owners() {
    let fx = fixture();
    let group = group_in(&fx, "n1").await;
    let device = device_in(&fx, "n2").await;

    assert_eq!(
        fx.guard.resolve_namespace(PathTarget::Group(group)).await.unwrap(),
        ns("n1")
    );
    assert_eq!(
        fx.guard.resolve_namespace(PathTarget::Device(device)).await.unwrap(),
        ns("n2")
    );
}

#[tokio::test]
async fn unknown_identifiers_are_not_found() {
    let fx = fixture();
    let scope = AuthorizedScope::read_write(ns("n1"));

    assert_matches!(
        fx.guard
            .authorize(&scope, GroupId::new().into(), Permission::Read)
            .await,
        Err(FleetError::NotFound { .. })
    );
    assert_matches!(
        fx.guard
            .authorize(&scope, DeviceUuid::new().into(), Permission::Read)
            .await,
        Err(FleetError::NotFound { .. })
    );
}

#[tokio::test]
async fn foreign_namespace_is_forbidden() {
    let fx = fixture();
    let group = group_in(&fx, "n1").await;
    let scope = AuthorizedScope::read_write(ns("n2"));

    assert_matches!(
        fx.guard.authorize(&scope, group.into(), Permission::Read).await,
        Err(FleetError::Forbidden { .. })
    );
}

#[tokio::test]
async fn read_scope_cannot_write() {
    let fx = fixture();
    let device = device_in(&fx, "n1").await;
    let scope = AuthorizedScope::read_only(ns("n1"));

    assert!(fx
        .guard
        .authorize(&scope, device.into(), Permission::Read)
        .await
        .is_ok());
    assert_matches!(
        fx.guard.authorize(&scope, device.into(), Permission::Write).await,
        Err(FleetError::Forbidden { .. })
    );
    assert_matches!(
        fx.guard.authorize_tenant(&scope, Permission::Write),
        Err(FleetError::Forbidden { .. })
    );
}

#[tokio::test]
async fn composed_targets_must_all_pass() {
    let fx = fixture();
    let group = group_in(&fx, "n1").await;
    let own_device = device_in(&fx, "n1").await;
    let foreign_device = device_in(&fx, "n2").await;
    let scope = AuthorizedScope::read_write(ns("n1"));

    fx.guard
        .authorize_all(&scope, &[group.into(), own_device.into()], Permission::Write)
        .await
        .unwrap();

    assert_matches!(
        fx.guard
            .authorize_all(&scope, &[group.into(), foreign_device.into()], Permission::Write)
            .await,
        Err(FleetError::Forbidden { .. })
    );
}

#[tokio::test]
async fn resolution_reflects_deletions() {
    let fx = fixture();
    let device = device_in(&fx, "n1").await;
    let scope = AuthorizedScope::read_write(ns("n1"));

    fx.guard
        .authorize(&scope, device.into(), Permission::Read)
        .await
        .unwrap();
    fx.devices.remove_device(device).await.unwrap();
    assert_matches!(
        fx.guard.authorize(&scope, device.into(), Permission::Read).await,
        Err(FleetError::NotFound { .. })
    );
}
