//! Publisher doubles

use async_trait::async_trait;
use fleet_core::{ChangePublisher, DeviceEvent, PublishError};
use std::sync::{Arc, Mutex};

/// Publisher that keeps every event in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl RecordingPublisher {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far
    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget recorded events
    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChangePublisher for RecordingPublisher {
    async fn publish(&self, event: DeviceEvent) -> Result<(), PublishError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Publisher whose every publish fails with the same error
#[derive(Debug, Clone)]
pub struct FailingPublisher {
    error: PublishError,
}

impl FailingPublisher {
    /// Fail with `error`
    pub fn new(error: PublishError) -> Self {
        Self { error }
    }

    /// Fail as if the consumer went away
    pub fn closed() -> Self {
        Self::new(PublishError::Closed)
    }
}

#[async_trait]
impl ChangePublisher for FailingPublisher {
    async fn publish(&self, _event: DeviceEvent) -> Result<(), PublishError> {
        Err(self.error.clone())
    }
}
