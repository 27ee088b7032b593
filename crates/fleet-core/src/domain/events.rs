//! Change events published after successful writes

use crate::{DeviceUuid, Namespace, NetworkInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event describing a change to a device's tracked state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Reported system info was created, replaced or cleared
    SystemInfoChanged {
        /// Owning tenant
        namespace: Namespace,
        /// Affected device
        device: DeviceUuid,
        /// New document, `None` when it was cleared
        system_info: Option<Value>,
        /// When the change was committed
        at: DateTime<Utc>,
    },
    /// Network identity was set
    NetworkInfoUpdated {
        /// Owning tenant
        namespace: Namespace,
        /// Affected device
        device: DeviceUuid,
        /// New network identity
        network: NetworkInfo,
        /// When the change was committed
        at: DateTime<Utc>,
    },
    /// Device was removed from the directory
    DeviceDecommissioned {
        /// Owning tenant
        namespace: Namespace,
        /// Removed device
        device: DeviceUuid,
        /// When the removal was committed
        at: DateTime<Utc>,
    },
}

impl DeviceEvent {
    /// Tenant the event belongs to
    pub fn namespace(&self) -> &Namespace {
        match self {
            Self::SystemInfoChanged { namespace, .. }
            | Self::NetworkInfoUpdated { namespace, .. }
            | Self::DeviceDecommissioned { namespace, .. } => namespace,
        }
    }

    /// Device the event is about
    pub fn device(&self) -> DeviceUuid {
        match self {
            Self::SystemInfoChanged { device, .. }
            | Self::NetworkInfoUpdated { device, .. }
            | Self::DeviceDecommissioned { device, .. } => *device,
        }
    }

    /// Short event name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SystemInfoChanged { .. } => "system_info_changed",
            Self::NetworkInfoUpdated { .. } => "network_info_updated",
            Self::DeviceDecommissioned { .. } => "device_decommissioned",
        }
    }
}
