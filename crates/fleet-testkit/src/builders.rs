//! Device builder for seeding directories

use fleet_core::{Device, DeviceId, Namespace, NetworkInfo};
use serde_json::Value;
use std::net::Ipv4Addr;

/// Builder for [`Device`] records
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    device: Device,
}

impl DeviceBuilder {
    /// Device `device_id` in `namespace`
    pub fn new(namespace: &str, device_id: &str) -> Self {
        Self {
            device: Device::new(
                Namespace::new(namespace).unwrap(),
                DeviceId::new(device_id).unwrap(),
            ),
        }
    }

    /// Attach a system info document
    pub fn system_info(mut self, document: Value) -> Self {
        self.device.system_info = Some(document);
        self
    }

    /// Attach a network identity
    pub fn network(mut self, ip: Ipv4Addr, hostname: &str, mac: &str) -> Self {
        self.device.network = Some(NetworkInfo {
            local_ipv4: ip,
            hostname: hostname.to_string(),
            mac_address: mac.to_string(),
        });
        self
    }

    /// Finished record
    pub fn build(self) -> Device {
        self.device
    }
}
