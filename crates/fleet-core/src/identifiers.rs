//! Identifier types used across Fleet
//!
//! Groups and devices are addressed by opaque UUIDs; the external device id,
//! namespace and group name are validated strings.

use crate::FleetError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length in bytes of a group name
pub const MAX_GROUP_NAME_LEN: usize = 200;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create from a UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            pub fn uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = FleetError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self).map_err(|e| {
                    FleetError::malformed_payload(format!("invalid {}: {}", $label, e))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_identifier!(
    /// Opaque unique identifier of a group
    GroupId,
    "group id"
);

uuid_identifier!(
    /// Internal unique identifier of a registered device
    DeviceUuid,
    "device uuid"
);

fn non_empty(kind: &str, value: String) -> Result<String, FleetError> {
    if value.trim().is_empty() {
        return Err(FleetError::malformed_payload(format!("{kind} must not be empty")));
    }
    Ok(value)
}

/// Externally assigned device identifier (serial number, VIN, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a device id, rejecting blank values
    pub fn new(value: impl Into<String>) -> Result<Self, FleetError> {
        non_empty("device id", value.into()).map(Self)
    }

    /// Borrow the raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Tenant boundary. Every group and device belongs to exactly one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace, rejecting blank values
    pub fn new(value: impl Into<String>) -> Result<Self, FleetError> {
        non_empty("namespace", value.into()).map(Self)
    }

    /// Borrow the raw namespace
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Group name, unique within a namespace (exact, case-sensitive match)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupName(String);

impl GroupName {
    /// Create a group name, rejecting blank or oversized values
    pub fn new(value: impl Into<String>) -> Result<Self, FleetError> {
        let value = non_empty("group name", value.into())?;
        if value.len() > MAX_GROUP_NAME_LEN {
            return Err(FleetError::malformed_payload(format!(
                "group name exceeds {MAX_GROUP_NAME_LEN} bytes"
            )));
        }
        Ok(Self(value))
    }

    /// Borrow the raw name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_identifier_impls {
    ($($name:ident),*) => {
        $(
            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl FromStr for $name {
                type Err = FleetError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    Self::new(s)
                }
            }

            impl TryFrom<String> for $name {
                type Error = FleetError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    Self::new(value)
                }
            }

            impl From<$name> for String {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

string_identifier_impls!(DeviceId, Namespace, GroupName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_identifier_roundtrip_display() {
        let id = GroupId::new();
        let parsed: GroupId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_invalid_uuid_is_malformed() {
        let err = "not-a-uuid".parse::<DeviceUuid>().unwrap_err();
        assert!(matches!(err, FleetError::MalformedPayload { .. }));
    }

    #[test]
    fn test_blank_names_rejected() {
        assert!(Namespace::new("").is_err());
        assert!(GroupName::new("   ").is_err());
        assert!(DeviceId::new("\t").is_err());
        assert!(GroupName::new("x".repeat(MAX_GROUP_NAME_LEN + 1)).is_err());
        assert!(GroupName::new("x".repeat(MAX_GROUP_NAME_LEN)).is_ok());
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let lower = GroupName::new("sensors").unwrap();
        let upper = GroupName::new("Sensors").unwrap();
        assert_ne!(lower, upper);
    }

    #[test]
    fn test_serde_validates() {
        let ns: Namespace = serde_json::from_str("\"acme\"").unwrap();
        assert_eq!(ns.as_str(), "acme");
        assert!(serde_json::from_str::<Namespace>("\"\"").is_err());
    }
}
