//! Effect traits
//!
//! Fleet's domain crates never touch storage or the message bus directly;
//! they go through these traits. Handlers live in `fleet-effects`.
//!
//! - [`GroupStore`]: group records and static membership rows
//! - [`DeviceDirectory`]: device records and their reported attributes
//! - [`ChangePublisher`]: outbound change notifications

pub mod devices;
pub mod groups;
pub mod publish;

pub use devices::{AttributePredicate, DeviceDirectory};
pub use groups::GroupStore;
pub use publish::{ChangePublisher, PublishError};
