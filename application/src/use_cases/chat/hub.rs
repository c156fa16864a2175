//! Broker-to-registry fanout task.
//!
//! Each process runs one hub. It subscribes to the shared broker and hands
//! every envelope to the process-local [`SubscriberRegistry`], which in turn
//! pushes into the per-connection queues without blocking.

use crate::ports::message_broker::MessageBroker;
use crate::ports::subscriber_registry::SubscriberRegistry;
use futures::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct ChatHub {
    cancellation: CancellationToken,
    handle: JoinHandle<()>,
}

impl ChatHub {
    /// Subscribe now and start delivering in the background.
    ///
    /// The subscription is taken before this returns, so frames published
    /// after `spawn` are never missed by this hub.
    pub fn spawn(
        broker: &dyn MessageBroker,
        registry: Arc<dyn SubscriberRegistry>,
        cancellation: CancellationToken,
    ) -> Self {
        let mut stream = broker.subscribe();
        let token = cancellation.clone();

        let handle = tokio::spawn(async move {
            loop {
                let envelope = tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    next = stream.next() => match next {
                        Some(envelope) => envelope,
                        None => {
                            warn!("Broker stream ended; chat fanout stopped");
                            break;
                        }
                    },
                };

                let report = registry.deliver(&envelope.trip_id, &envelope.frame);
                if report.evicted > 0 {
                    debug!(
                        "Delivered to {} connections of {}, evicted {}",
                        report.delivered, envelope.trip_id, report.evicted
                    );
                }
            }
            info!("Chat hub stopped");
        });

        Self {
            cancellation,
            handle,
        }
    }

    /// Stop delivering and wait for the task to exit.
    pub async fn shutdown(self) {
        self.cancellation.cancel();
        if let Err(err) = self.handle.await {
            warn!("Chat hub task failed: {}", err);
        }
    }
}
