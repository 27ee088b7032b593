//! Change notifier
//!
//! Two publish contracts, chosen per call site:
//!
//! - *safe*: the write already committed; a failed publish is logged and
//!   dropped, never reported to the caller
//! - *must-succeed*: a failed publish fails the operation, even though the
//!   write it follows is durable

use chrono::Utc;
use fleet_core::{
    ChangePublisher, DeviceEvent, DeviceUuid, FleetError, Namespace, NetworkInfo, PublishError,
    Result,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Emits device change events after successful writes
#[derive(Clone)]
pub struct ChangeNotifier {
    publisher: Arc<dyn ChangePublisher>,
}

impl ChangeNotifier {
    /// Create a notifier over a publisher
    pub fn new(publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { publisher }
    }

    /// Announce a system info change. `None` means the document was cleared.
    ///
    /// Failures are absorbed.
    pub async fn publish_safe(
        &self,
        namespace: Namespace,
        device: DeviceUuid,
        system_info: Option<Value>,
    ) {
        self.absorb(DeviceEvent::SystemInfoChanged {
            namespace,
            device,
            system_info,
            at: Utc::now(),
        })
        .await;
    }

    /// Announce a device removal. Failures are absorbed.
    pub async fn publish_decommissioned(&self, namespace: Namespace, device: DeviceUuid) {
        self.absorb(DeviceEvent::DeviceDecommissioned {
            namespace,
            device,
            at: Utc::now(),
        })
        .await;
    }

    /// Announce a network identity change.
    ///
    /// Fails with `Publish` if the event could not be handed off.
    pub async fn publish_network_update(
        &self,
        namespace: Namespace,
        device: DeviceUuid,
        network: NetworkInfo,
    ) -> Result<()> {
        let event = DeviceEvent::NetworkInfoUpdated {
            namespace,
            device,
            network,
            at: Utc::now(),
        };
        self.publisher.publish(event).await.map_err(|err| {
            warn!(%device, error = %err, "network update notification failed");
            FleetError::from(err)
        })
    }

    async fn absorb(&self, event: DeviceEvent) {
        let kind = event.kind();
        let device = event.device();
        match self.publisher.publish(event).await {
            Ok(()) => debug!(kind, %device, "published change event"),
            Err(err) => log_absorbed(kind, device, &err),
        }
    }
}

fn log_absorbed(kind: &str, device: DeviceUuid, err: &PublishError) {
    warn!(kind, %device, error = %err, "change notification dropped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use fleet_effects::ChannelPublisher;
    use std::net::Ipv4Addr;
    use std::time::Duration;

    fn network() -> NetworkInfo {
        NetworkInfo {
            local_ipv4: Ipv4Addr::new(192, 168, 1, 20),
            hostname: "edge".to_string(),
            mac_address: "aa:bb:cc:dd:ee:ff".to_string(),
        }
    }

    #[tokio::test]
    async fn test_safe_publish_delivers_event() {
        let (publisher, mut rx) = ChannelPublisher::new(4, Duration::from_millis(50));
        let notifier = ChangeNotifier::new(Arc::new(publisher));
        let device = DeviceUuid::new();

        notifier
            .publish_safe(Namespace::new("n").unwrap(), device, None)
            .await;

        let event = rx.recv().await.unwrap();
        assert_matches!(event, DeviceEvent::SystemInfoChanged { system_info: None, .. });
        assert_eq!(event.device(), device);
    }

    #[tokio::test]
    async fn test_safe_publish_absorbs_closed_channel() {
        let (publisher, rx) = ChannelPublisher::new(4, Duration::from_millis(50));
        drop(rx);
        let notifier = ChangeNotifier::new(Arc::new(publisher));

        notifier
            .publish_safe(Namespace::new("n").unwrap(), DeviceUuid::new(), None)
            .await;
        notifier
            .publish_decommissioned(Namespace::new("n").unwrap(), DeviceUuid::new())
            .await;
    }

    #[tokio::test]
    async fn test_network_update_surfaces_failure() {
        let (publisher, rx) = ChannelPublisher::new(4, Duration::from_millis(50));
        drop(rx);
        let notifier = ChangeNotifier::new(Arc::new(publisher));

        let result = notifier
            .publish_network_update(Namespace::new("n").unwrap(), DeviceUuid::new(), network())
            .await;
        assert_matches!(result, Err(FleetError::Publish { .. }));
    }

    #[tokio::test]
    async fn test_network_update_full_channel_times_out() {
        let (publisher, _rx) = ChannelPublisher::new(1, Duration::from_millis(10));
        let notifier = ChangeNotifier::new(Arc::new(publisher));
        let ns = Namespace::new("n").unwrap();

        notifier
            .publish_network_update(ns.clone(), DeviceUuid::new(), network())
            .await
            .unwrap();
        let result = notifier
            .publish_network_update(ns, DeviceUuid::new(), network())
            .await;
        assert_matches!(result, Err(FleetError::Publish { .. }));
    }
}
