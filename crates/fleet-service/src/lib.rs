//! # Fleet Service - Layer 6: Runtime
//!
//! **Purpose**: The operation surface a transport layer calls into.
//!
//! [`FleetService`] puts the authorization guard in front of the group
//! registry, the membership engine and the device services. Each method takes
//! the caller's [`AuthorizedScope`](fleet_authorization::AuthorizedScope) and
//! returns a [`FleetError`](fleet_core::FleetError) whose
//! `status_code()` the transport reports.
//!
//! ```ignore
//! let service = FleetServiceBuilder::new().with_config(config).build()?;
//! let scope = AuthorizedScope::read_write(Namespace::new("acme")?);
//! let id = service
//!     .create_group(&scope, GroupDefinition::dynamic_group(name, "role == sensor"))
//!     .await?;
//! let members = service
//!     .list_devices(&scope, id, PageRequest::default(), ListingShape::WithExternalId)
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod detached;

/// Service builder
pub mod builder;

/// Member listing shapes
pub mod listing;

/// Operation facade
pub mod service;

pub use builder::FleetServiceBuilder;
pub use listing::{DeviceEntry, ListingShape};
pub use service::FleetService;
