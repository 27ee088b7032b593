//! Bounded channel publisher
//!
//! Hands events to an in-process consumer through a tokio mpsc channel. A
//! publish waits up to the configured timeout for room, then fails with
//! [`PublishError::Full`]; once the receiver is dropped every publish fails
//! with [`PublishError::Closed`].

use async_trait::async_trait;
use fleet_core::{ChangePublisher, DeviceEvent, NotifierConfig, PublishError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::trace;

/// Publisher backed by a bounded mpsc channel
#[derive(Clone)]
pub struct ChannelPublisher {
    sender: mpsc::Sender<DeviceEvent>,
    send_timeout: Duration,
}

impl ChannelPublisher {
    /// Create a publisher and the receiving end of its channel
    pub fn new(capacity: usize, send_timeout: Duration) -> (Self, mpsc::Receiver<DeviceEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                send_timeout,
            },
            receiver,
        )
    }

    /// Create a publisher sized by the notifier configuration
    pub fn from_config(config: &NotifierConfig) -> (Self, mpsc::Receiver<DeviceEvent>) {
        Self::new(
            config.channel_capacity,
            Duration::from_millis(config.send_timeout_ms),
        )
    }
}

#[async_trait]
impl ChangePublisher for ChannelPublisher {
    async fn publish(&self, event: DeviceEvent) -> Result<(), PublishError> {
        let kind = event.kind();
        match self.sender.send_timeout(event, self.send_timeout).await {
            Ok(()) => {
                trace!(kind, "event queued");
                Ok(())
            }
            Err(SendTimeoutError::Closed(_)) => Err(PublishError::Closed),
            Err(SendTimeoutError::Timeout(_)) => Err(PublishError::Full {
                timeout_ms: u64::try_from(self.send_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
