//! Device records owned by the device directory

use crate::{AttributeSet, DeviceId, DeviceUuid, Namespace};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::Ipv4Addr;

/// Attribute path under which the external device id is exposed
pub const DEVICE_ID_ATTRIBUTE: &str = "device_id";

/// Network identity reported by a device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// Address on the device's local network
    pub local_ipv4: Ipv4Addr,
    /// Reported hostname
    pub hostname: String,
    /// MAC address of the primary interface
    pub mac_address: String,
}

/// A registered device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Internal identifier
    pub uuid: DeviceUuid,
    /// Externally assigned identifier
    pub device_id: DeviceId,
    /// Owning tenant
    pub namespace: Namespace,
    /// Last reported system info document
    pub system_info: Option<Value>,
    /// Last reported network identity
    pub network: Option<NetworkInfo>,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Register a device with no reported attributes yet
    pub fn new(namespace: Namespace, device_id: DeviceId) -> Self {
        Self {
            uuid: DeviceUuid::new(),
            device_id,
            namespace,
            system_info: None,
            network: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a system info document
    pub fn with_system_info(mut self, system_info: Value) -> Self {
        self.system_info = Some(system_info);
        self
    }

    /// Attach a network identity
    pub fn with_network(mut self, network: NetworkInfo) -> Self {
        self.network = Some(network);
        self
    }

    /// Uuid and external id pair used in listings
    pub fn reference(&self) -> DeviceReference {
        DeviceReference {
            uuid: self.uuid,
            device_id: self.device_id.clone(),
        }
    }

    /// Current attribute set, recomputed from the stored documents
    pub fn attributes(&self) -> AttributeSet {
        let mut attrs = AttributeSet::new();
        if let Some(info) = &self.system_info {
            attrs.extend_from_document("", info);
        }
        if let Some(net) = &self.network {
            attrs.insert("network.local_ipv4", net.local_ipv4.to_string());
            attrs.insert("network.hostname", net.hostname.clone());
            attrs.insert("network.mac_address", net.mac_address.clone());
        }
        attrs.insert(DEVICE_ID_ATTRIBUTE, self.device_id.as_str());
        attrs
    }
}

/// Device identity pair returned by membership listings
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceReference {
    /// Internal identifier
    pub uuid: DeviceUuid,
    /// Externally assigned identifier
    pub device_id: DeviceId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_merge_sources() {
        let device = Device::new(Namespace::new("acme").unwrap(), DeviceId::new("vin-1").unwrap())
            .with_system_info(json!({ "role": "sensor", "device_id": "spoofed" }))
            .with_network(NetworkInfo {
                local_ipv4: Ipv4Addr::new(10, 0, 0, 7),
                hostname: "edge-7".to_string(),
                mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
            });

        let attrs = device.attributes();
        assert_eq!(attrs.get("role"), Some("sensor"));
        assert_eq!(attrs.get("network.local_ipv4"), Some("10.0.0.7"));
        assert_eq!(attrs.get("network.hostname"), Some("edge-7"));
        // the registered id always wins over a reported one
        assert_eq!(attrs.get(DEVICE_ID_ATTRIBUTE), Some("vin-1"));
    }

    #[test]
    fn test_network_info_wire_shape() {
        let net: NetworkInfo = serde_json::from_value(json!({
            "localIpv4": "192.168.1.2",
            "hostname": "h",
            "macAddress": "m",
        }))
        .unwrap();
        assert_eq!(net.local_ipv4, Ipv4Addr::new(192, 168, 1, 2));
    }
}
