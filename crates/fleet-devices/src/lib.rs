//! # Fleet Devices - Layer 2: Domain
//!
//! **Purpose**: Device-side writes and the notifications they trigger.
//!
//! - [`SystemInfoService`]: system info and network identity documents
//! - [`DeviceLifecycle`]: registration and decommissioning
//! - [`ChangeNotifier`]: safe and must-succeed publication of change events

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Registration and decommissioning
pub mod lifecycle;

/// Change notification
pub mod notifier;

/// Reported documents
pub mod system_info;

pub use lifecycle::DeviceLifecycle;
pub use notifier::ChangeNotifier;
pub use system_info::{SystemInfoService, UpsertOutcome};
