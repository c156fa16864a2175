//! In-process message broker over `tokio::sync::broadcast`.
//!
//! Every [`subscribe`](MessageBroker::subscribe) call gets its own receiver,
//! so several chat hubs on one broker behave like several processes on a
//! shared pub/sub layer.
//!
//! A hub that falls more than `capacity` envelopes behind loses the oldest
//! ones. That is safe: connections detect the resulting id gap and fill it
//! from history.

use futures::stream::{self, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use vibecation_application::{BrokerEnvelope, BrokerError, BrokerStream, MessageBroker};
use vibecation_domain::{ServerFrame, TripId};

#[derive(Debug, Clone)]
pub struct InProcessBroker {
    sender: broadcast::Sender<BrokerEnvelope>,
}

impl InProcessBroker {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Number of live subscriptions (one per hub)
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl MessageBroker for InProcessBroker {
    fn publish(&self, trip_id: &TripId, frame: ServerFrame) -> Result<(), BrokerError> {
        // Err only means nobody is subscribed yet.
        let _ = self.sender.send(BrokerEnvelope {
            trip_id: trip_id.clone(),
            frame,
        });
        Ok(())
    }

    fn subscribe(&self) -> BrokerStream {
        let receiver = self.sender.subscribe();
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(envelope) => return Some((envelope, receiver)),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Broker subscriber lagged, skipped {} envelopes", skipped);
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        })
        .boxed()
    }
}
