//! # Fleet Core - Layer 1: Foundation
//!
//! **Purpose**: Shared vocabulary for the Fleet device group service.
//!
//! This crate provides the identifiers, domain records, error type and effect
//! traits every other Fleet crate builds on.
//!
//! # Architecture Constraints
//!
//! - YES Identifier newtypes and domain records
//! - YES Unified error type and pagination contract
//! - YES Effect trait definitions (storage, directory, publishing)
//! - NO effect handler implementations (that's `fleet-effects`)
//! - NO authorization or membership logic (that's `fleet-authorization`, `fleet-groups`)
//!
//! ## Core Concepts
//!
//! - **Namespace**: tenant boundary every group and device belongs to
//! - **Group**: static (stored members) or dynamic (expression-derived members)
//! - **Attribute set**: flattened view of a device's reported documents

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Flattened device attributes
pub mod attributes;

/// Service configuration
pub mod config;

/// Group, device and event records
pub mod domain;

/// Effect traits implemented by handlers
pub mod effects;

/// Unified error type
pub mod errors;

/// Identifier newtypes
pub mod identifiers;

/// Offset/limit pagination
pub mod page;

pub use attributes::AttributeSet;
pub use config::{FleetConfig, LoggingConfig, NotifierConfig, PaginationConfig};
pub use domain::{
    Device, DeviceEvent, DeviceReference, Group, GroupKind, GroupType, NetworkInfo,
    DEVICE_ID_ATTRIBUTE,
};
pub use effects::{AttributePredicate, ChangePublisher, DeviceDirectory, GroupStore, PublishError};
pub use errors::{FleetError, Result};
pub use identifiers::{DeviceId, DeviceUuid, GroupId, GroupName, Namespace};
pub use page::{Page, PagePolicy, PageRequest, Paginated};
