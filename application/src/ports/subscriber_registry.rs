//! Subscriber registry port
//!
//! Maps trip -> user -> live connection handles for the connections held by
//! this process. Delivery never blocks: a connection whose queue is full is
//! evicted and recovers through history on reconnect.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use vibecation_domain::{ServerFrame, TripId, UserId};

/// Handle identifying one registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Outcome of delivering one frame to a trip's connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub evicted: usize,
}

/// Registry of live connections held by this process
pub trait SubscriberRegistry: Send + Sync {
    fn register(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        sender: mpsc::Sender<ServerFrame>,
    ) -> ConnectionId;

    /// Remove one connection; returns false if it was already gone.
    fn deregister(&self, trip_id: &TripId, connection: ConnectionId) -> bool;

    /// Push a frame to every connection of the trip.
    fn deliver(&self, trip_id: &TripId, frame: &ServerFrame) -> DeliveryReport;

    fn connection_count(&self, trip_id: &TripId) -> usize;

    fn user_connection_count(&self, trip_id: &TripId, user_id: &UserId) -> usize;
}

type UserConnections = HashMap<UserId, HashMap<ConnectionId, mpsc::Sender<ServerFrame>>>;

/// Process-local registry.
#[derive(Default)]
pub struct LocalSubscriberRegistry {
    trips: Mutex<HashMap<TripId, UserConnections>>,
    next_id: AtomicU64,
}

impl LocalSubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every critical section leaves the map consistent; a poisoned lock is
    /// taken over as is.
    fn trips(&self) -> MutexGuard<'_, HashMap<TripId, UserConnections>> {
        self.trips.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SubscriberRegistry for LocalSubscriberRegistry {
    fn register(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        sender: mpsc::Sender<ServerFrame>,
    ) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.trips()
            .entry(trip_id.clone())
            .or_default()
            .entry(user_id.clone())
            .or_default()
            .insert(id, sender);
        debug!("Registered {} for {} in {}", id, user_id, trip_id);
        id
    }

    fn deregister(&self, trip_id: &TripId, connection: ConnectionId) -> bool {
        let mut trips = self.trips();
        let Some(users) = trips.get_mut(trip_id) else {
            return false;
        };

        let mut removed = false;
        users.retain(|_, conns| {
            removed |= conns.remove(&connection).is_some();
            !conns.is_empty()
        });
        if users.is_empty() {
            trips.remove(trip_id);
        }
        if removed {
            debug!("Deregistered {} from {}", connection, trip_id);
        }
        removed
    }

    fn deliver(&self, trip_id: &TripId, frame: &ServerFrame) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let mut trips = self.trips();
        let Some(users) = trips.get_mut(trip_id) else {
            return report;
        };

        for (user_id, conns) in users.iter_mut() {
            conns.retain(|id, sender| match sender.try_send(frame.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    warn!("Evicting lagging connection {} of {} in {}", id, user_id, trip_id);
                    report.evicted += 1;
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    report.evicted += 1;
                    false
                }
            });
        }
        users.retain(|_, conns| !conns.is_empty());
        if users.is_empty() {
            trips.remove(trip_id);
        }
        report
    }

    fn connection_count(&self, trip_id: &TripId) -> usize {
        self.trips()
            .get(trip_id)
            .map(|users| users.values().map(|c| c.len()).sum())
            .unwrap_or(0)
    }

    fn user_connection_count(&self, trip_id: &TripId, user_id: &UserId) -> usize {
        self.trips()
            .get(trip_id)
            .and_then(|users| users.get(user_id))
            .map(|c| c.len())
            .unwrap_or(0)
    }
}
