//! Chat service: membership-checked connect, send and history.

use super::connection::ChatConnection;
use crate::config::ChatParams;
use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::message_broker::MessageBroker;
use crate::ports::phase_notifier::PhaseNotifier;
use crate::ports::store::{ChatStore, MembershipDirectory};
use crate::ports::subscriber_registry::SubscriberRegistry;
use crate::use_cases::shared::{load_member_trip, load_trip};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vibecation_domain::{
    ChatMessage, CorrelationToken, DomainError, MessageId, NewChatMessage, Phase, PhaseStatus,
    ServerFrame, TripId, UserId,
};

pub struct ChatService {
    directory: Arc<dyn MembershipDirectory>,
    store: Arc<dyn ChatStore>,
    broker: Arc<dyn MessageBroker>,
    registry: Arc<dyn SubscriberRegistry>,
    params: ChatParams,
    audit: Arc<dyn AuditLog>,
}

impl ChatService {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        store: Arc<dyn ChatStore>,
        broker: Arc<dyn MessageBroker>,
        registry: Arc<dyn SubscriberRegistry>,
    ) -> Self {
        Self {
            directory,
            store,
            broker,
            registry,
            params: ChatParams::default(),
            audit: Arc::new(NoAuditLog),
        }
    }

    pub fn with_params(mut self, params: ChatParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn params(&self) -> &ChatParams {
        &self.params
    }

    /// Open a live connection.
    ///
    /// The welcome advertises the latest id seen before registering. Every
    /// message after it (or after `since`, when given) is streamed: the ones
    /// appended while registering come from history, the rest from the
    /// broker, and the connection drops whichever copy arrives second.
    pub async fn connect(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        since: Option<MessageId>,
    ) -> Result<ChatConnection, DomainError> {
        load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;
        let baseline = self.store.latest_id(trip_id).await?;

        let (tx, rx) = mpsc::channel(self.params.connection_buffer.max(1));
        let id = self.registry.register(trip_id, user_id, tx);
        let latest = match self.store.latest_id(trip_id).await {
            Ok(latest) => latest,
            Err(err) => {
                self.registry.deregister(trip_id, id);
                return Err(err.into());
            }
        };

        let start = since.map_or(baseline, |s| s.min(latest));
        let mut connection = ChatConnection::new(
            id,
            trip_id.clone(),
            user_id.clone(),
            rx,
            start,
            self.store.clone(),
            self.registry.clone(),
            self.params.max_history_limit,
        );
        connection.push(ServerFrame::Welcome {
            trip_id: trip_id.clone(),
            user_id: user_id.clone(),
            last_message_id: baseline,
            reconnect_backoff_secs: self.params.reconnect_backoff_secs,
        });
        connection.catch_up(latest).await?;

        info!("{} connected to {} chat as {}", user_id, trip_id, id);
        Ok(connection)
    }

    /// Persist a message and broadcast it to every connection of the trip.
    pub async fn send(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        content: &str,
        correlation: Option<CorrelationToken>,
    ) -> Result<ChatMessage, DomainError> {
        load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;
        let draft = NewChatMessage::new(trip_id.clone(), user_id.clone(), content, correlation)?;

        let message = self.store.append(draft).await?;
        debug!("Stored message {} in {}", message.message_id, trip_id);

        // Persisted messages stay reachable through history even if the
        // broadcast is lost, so a publish failure does not fail the send.
        if let Err(err) = self.broker.publish(
            trip_id,
            ServerFrame::Message {
                message: message.clone(),
            },
        ) {
            warn!("Broadcast of message {} in {} failed: {}", message.message_id, trip_id, err);
        }

        self.audit.record(AuditEvent::new(
            "message_sent",
            json!({ "trip": trip_id, "user": user_id, "message_id": message.message_id }),
        ));
        Ok(message)
    }

    /// Stored messages after `since`, ascending, with a clamped page size.
    pub async fn history(
        &self,
        trip_id: &TripId,
        since: Option<MessageId>,
        limit: Option<usize>,
    ) -> Result<Vec<ChatMessage>, DomainError> {
        load_trip(self.directory.as_ref(), trip_id).await?;
        let limit = self.params.clamp_limit(limit);
        Ok(self
            .store
            .history(trip_id, since.unwrap_or(MessageId::ZERO), limit)
            .await?)
    }
}

impl PhaseNotifier for ChatService {
    fn on_status_changed(&self, trip_id: &TripId, status: &PhaseStatus) {
        let frame = ServerFrame::PhaseStatus {
            trip_id: trip_id.clone(),
            status: *status,
        };
        if let Err(err) = self.broker.publish(trip_id, frame) {
            warn!("Phase status push for {} failed: {}", trip_id, err);
        }
    }

    fn on_phase_finalized(&self, trip_id: &TripId, phase: Phase) {
        let frame = ServerFrame::PhaseComplete {
            trip_id: trip_id.clone(),
            phase,
        };
        if let Err(err) = self.broker.publish(trip_id, frame) {
            warn!("Phase complete push for {} failed: {}", trip_id, err);
        }
    }
}
