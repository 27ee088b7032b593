//! # Fleet Groups - Layer 2: Domain
//!
//! **Purpose**: Device groups and their membership.
//!
//! - [`Expression`]: the attribute predicate language of dynamic groups
//! - [`GroupRegistry`]: group records (create, get, list, rename)
//! - [`GroupMembershipEngine`]: membership listing, counting and static writes
//!
//! Authorization is not checked here; callers go through
//! `fleet-authorization` first.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Membership expression language
pub mod expression;

/// Membership engine
pub mod membership;

/// Group registry
pub mod registry;

pub use expression::{Expression, ExpressionError};
pub use membership::GroupMembershipEngine;
pub use registry::{GroupDefinition, GroupRegistry};
