//! Message broker port
//!
//! Broadcasts leave a process through the broker and come back to every
//! process's [`ChatHub`](crate::use_cases::chat::ChatHub), which delivers them
//! to its local subscriber registry. A single-process deployment uses an
//! in-process broker; a multi-process one plugs in a shared pub/sub layer.

use futures::stream::BoxStream;
use thiserror::Error;
use vibecation_domain::{ServerFrame, TripId};

/// Errors that can occur when publishing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Broker closed")]
    Closed,
}

/// A frame addressed to every subscriber of one trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEnvelope {
    pub trip_id: TripId,
    pub frame: ServerFrame,
}

/// Stream of envelopes received from the broker
pub type BrokerStream = BoxStream<'static, BrokerEnvelope>;

/// Shared pub/sub seam for trip broadcasts
pub trait MessageBroker: Send + Sync {
    /// Publish a frame for a trip. Having no subscribers is not an error.
    fn publish(&self, trip_id: &TripId, frame: ServerFrame) -> Result<(), BrokerError>;

    /// Receive everything published from now on, from any process.
    fn subscribe(&self) -> BrokerStream;
}
