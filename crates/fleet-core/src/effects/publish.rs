//! Change publication effect

use crate::{DeviceEvent, FleetError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error type for publish operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum PublishError {
    /// Nobody is consuming events any more
    #[error("event channel closed")]
    Closed,

    /// Channel stayed full for the whole send timeout
    #[error("event channel full after {timeout_ms}ms")]
    Full {
        /// How long the publisher waited
        timeout_ms: u64,
    },

    /// Broker or transport failure
    #[error("transport failure: {reason}")]
    Transport {
        /// Failure description
        reason: String,
    },
}

impl From<PublishError> for FleetError {
    fn from(err: PublishError) -> Self {
        FleetError::publish(err.to_string())
    }
}

/// Outbound side of the notification channel
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    /// Emit one event
    async fn publish(&self, event: DeviceEvent) -> Result<(), PublishError>;
}
