//! # Fleet Authorization - Layer 2: Domain
//!
//! **Purpose**: Decide whether a caller may act on a group or device.
//!
//! Every group and device belongs to exactly one namespace. A request is
//! authorized iff the namespace owning the identifier in its path equals the
//! namespace of the caller's [`AuthorizedScope`] and the scope's permission
//! level covers the requested [`Permission`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Namespace resolution and scope checks
pub mod guard;

/// Scopes, permissions and access decisions
pub mod scope;

pub use guard::{AuthorizationGuard, PathTarget};
pub use scope::{AccessDecision, AuthorizedScope, Permission, PermissionLevel};
