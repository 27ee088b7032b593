//! Offline membership evaluation
//!
//! Loads a fleet fixture into an in-memory service and prints the members of
//! every group. Fixture format:
//!
//! ```toml
//! [[devices]]
//! namespace = "acme"
//! device_id = "vin-1"
//! system_info = { role = "sensor", firmware = { version = "2.1.0" } }
//!
//! [[groups]]
//! namespace = "acme"
//! name = "sensors"
//! group_type = "dynamic"
//! expression = 'role == "sensor"'
//!
//! [[groups]]
//! namespace = "acme"
//! name = "pilot"
//! group_type = "static"
//! members = ["vin-1"]
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Args;
use fleet_authorization::AuthorizedScope;
use fleet_core::{DeviceId, DeviceUuid, FleetConfig, GroupName, GroupType, Namespace, PageRequest};
use fleet_groups::GroupDefinition;
use fleet_service::{DeviceEntry, FleetServiceBuilder, ListingShape};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

/// Arguments for `fleet evaluate`
#[derive(Debug, Clone, Args)]
pub struct EvaluateArgs {
    /// Fixture describing devices and groups
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Only report groups of this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Fixture {
    #[serde(default)]
    devices: Vec<FixtureDevice>,
    #[serde(default)]
    groups: Vec<FixtureGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDevice {
    namespace: String,
    device_id: String,
    #[serde(default)]
    system_info: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureGroup {
    namespace: String,
    name: String,
    group_type: GroupType,
    #[serde(default)]
    expression: Option<String>,
    #[serde(default)]
    members: Vec<String>,
}

/// Members of one group after evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReport {
    /// Owning namespace
    pub namespace: String,
    /// Group name
    pub name: String,
    /// Static or dynamic
    pub group_type: GroupType,
    /// External ids of the members, in listing order
    pub members: Vec<String>,
}

/// Load the fixture and print each group's members
pub async fn run(args: &EvaluateArgs, config: FleetConfig) -> Result<()> {
    let content = std::fs::read_to_string(&args.fixture)
        .with_context(|| format!("reading {}", args.fixture.display()))?;
    let fixture: Fixture = toml::from_str(&content)
        .with_context(|| format!("parsing {}", args.fixture.display()))?;

    for report in evaluate(fixture, config).await? {
        if args
            .namespace
            .as_deref()
            .is_some_and(|ns| ns != report.namespace)
        {
            continue;
        }
        println!(
            "{}/{} ({}): {} member(s)",
            report.namespace,
            report.name,
            report.group_type,
            report.members.len()
        );
        for member in &report.members {
            println!("  {member}");
        }
    }
    Ok(())
}

async fn evaluate(fixture: Fixture, config: FleetConfig) -> Result<Vec<GroupReport>> {
    let service = FleetServiceBuilder::new().with_config(config).build()?;
    let mut uuids: HashMap<(String, String), DeviceUuid> = HashMap::new();

    for device in &fixture.devices {
        let scope = writer(&device.namespace)?;
        let registered = service
            .register_device(&scope, DeviceId::new(device.device_id.as_str())?)
            .await
            .with_context(|| format!("registering device {}", device.device_id))?;
        if let Some(info) = &device.system_info {
            service
                .upsert_system_info(&scope, registered.uuid, &serde_json::to_string(info)?)
                .await
                .with_context(|| format!("system info of {}", device.device_id))?;
        }
        uuids.insert(
            (device.namespace.clone(), device.device_id.clone()),
            registered.uuid,
        );
    }
    info!(devices = uuids.len(), "loaded fixture devices");

    let mut reports = Vec::with_capacity(fixture.groups.len());
    for group in fixture.groups {
        let scope = writer(&group.namespace)?;
        let definition = GroupDefinition {
            name: GroupName::new(group.name.as_str())?,
            group_type: group.group_type,
            expression: group.expression,
        };
        let id = service
            .create_group(&scope, definition)
            .await
            .with_context(|| format!("creating group {}", group.name))?;

        for member in &group.members {
            let uuid = uuids
                .get(&(group.namespace.clone(), member.clone()))
                .ok_or_else(|| anyhow!("group {} lists unknown device {member}", group.name))?;
            service
                .add_device_to_group(&scope, id, *uuid)
                .await
                .with_context(|| format!("adding {member} to {}", group.name))?;
        }

        let mut members = Vec::new();
        let mut offset = 0;
        loop {
            let page = service
                .list_devices(
                    &scope,
                    id,
                    PageRequest {
                        offset: Some(offset),
                        limit: None,
                    },
                    ListingShape::WithExternalId,
                )
                .await?;
            offset += page.values.len() as u64;
            let more = page.has_more() && !page.values.is_empty();
            members.extend(page.values.into_iter().filter_map(|entry| match entry {
                DeviceEntry::Reference(reference) => Some(reference.device_id.to_string()),
                DeviceEntry::Id(_) => None,
            }));
            if !more {
                break;
            }
        }

        reports.push(GroupReport {
            namespace: group.namespace,
            name: group.name,
            group_type: group.group_type,
            members,
        });
    }
    Ok(reports)
}

fn writer(namespace: &str) -> Result<AuthorizedScope> {
    Ok(AuthorizedScope::read_write(Namespace::new(namespace)?))
}
