//! # Fleet Effects - Layer 3: Handlers
//!
//! **Purpose**: Implementations of the effect traits declared in `fleet-core`.
//!
//! - [`MemoryGroupStore`] / [`MemoryDeviceDirectory`]: in-process persistence
//!   behind `tokio::sync::RwLock`; every trait call is one critical section
//! - [`ChannelPublisher`]: bounded mpsc hand-off to an event consumer
//! - [`LogPublisher`]: writes events to the log only

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// In-memory persistence handlers
pub mod memory {
    /// Device directory handler
    pub mod devices;
    /// Group store handler
    pub mod groups;

    pub use devices::MemoryDeviceDirectory;
    pub use groups::MemoryGroupStore;
}

/// Change publisher handlers
pub mod publish {
    /// Bounded channel publisher
    pub mod channel;
    /// Log-only publisher
    pub mod log;

    pub use channel::ChannelPublisher;
    pub use log::LogPublisher;
}

pub use memory::{MemoryDeviceDirectory, MemoryGroupStore};
pub use publish::{ChannelPublisher, LogPublisher};
