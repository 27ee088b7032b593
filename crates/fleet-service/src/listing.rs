//! Response shape of group member listings

use fleet_core::{DeviceReference, DeviceUuid};
use serde::{Deserialize, Serialize};

/// Which fields a member listing returns. Chosen by the transport layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingShape {
    /// Device uuids only
    #[default]
    Ids,
    /// Uuid plus external device id
    WithExternalId,
}

/// One entry of a member listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeviceEntry {
    /// Shape [`ListingShape::Ids`]
    Id(DeviceUuid),
    /// Shape [`ListingShape::WithExternalId`]
    Reference(DeviceReference),
}

impl DeviceEntry {
    /// Project a reference into the requested shape
    pub fn shaped(reference: DeviceReference, shape: ListingShape) -> Self {
        match shape {
            ListingShape::Ids => Self::Id(reference.uuid),
            ListingShape::WithExternalId => Self::Reference(reference),
        }
    }

    /// Internal identifier of the entry
    pub fn uuid(&self) -> DeviceUuid {
        match self {
            Self::Id(uuid) => *uuid,
            Self::Reference(reference) => reference.uuid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::DeviceId;
    use serde_json::json;

    #[test]
    fn test_shapes_serialize_differently() {
        let reference = DeviceReference {
            uuid: DeviceUuid::new(),
            device_id: DeviceId::new("vin-9").unwrap(),
        };

        let id = DeviceEntry::shaped(reference.clone(), ListingShape::Ids);
        assert_eq!(
            serde_json::to_value(&id).unwrap(),
            json!(reference.uuid.to_string())
        );

        let full = DeviceEntry::shaped(reference.clone(), ListingShape::WithExternalId);
        let value = serde_json::to_value(&full).unwrap();
        assert_eq!(value["device_id"], json!("vin-9"));
        assert_eq!(full.uuid(), reference.uuid);
    }
}
