//! Publisher that only records events in the log. Used when no consumer is wired.

use async_trait::async_trait;
use fleet_core::{ChangePublisher, DeviceEvent, PublishError};
use tracing::info;

/// Publisher writing each event to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl ChangePublisher for LogPublisher {
    async fn publish(&self, event: DeviceEvent) -> Result<(), PublishError> {
        info!(
            kind = event.kind(),
            namespace = %event.namespace(),
            device = %event.device(),
            "device event"
        );
        Ok(())
    }
}
