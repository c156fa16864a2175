//! One live chat connection.
//!
//! The connection owns the receiving half of its bounded queue and turns the
//! broker's at-least-once, possibly reordered deliveries into a stream whose
//! message ids are strictly increasing with no gaps:
//!
//! - a message at or below `last_seen` is a duplicate and dropped
//! - a message above `last_seen + 1` triggers a history read for the gap
//!
//! The gap read is always complete because the store allocates ids and
//! persists in one atomic step.

use crate::ports::store::ChatStore;
use crate::ports::subscriber_registry::{ConnectionId, SubscriberRegistry};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use vibecation_domain::{
    ChannelErrorCode, ChatMessage, DomainError, MessageId, ServerFrame, TripId, UserId,
};

pub struct ChatConnection {
    id: ConnectionId,
    trip_id: TripId,
    user_id: UserId,
    rx: mpsc::Receiver<ServerFrame>,
    pending: VecDeque<ServerFrame>,
    last_seen: MessageId,
    store: Arc<dyn ChatStore>,
    registry: Arc<dyn SubscriberRegistry>,
    page_limit: usize,
    failed: bool,
}

impl ChatConnection {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        id: ConnectionId,
        trip_id: TripId,
        user_id: UserId,
        rx: mpsc::Receiver<ServerFrame>,
        last_seen: MessageId,
        store: Arc<dyn ChatStore>,
        registry: Arc<dyn SubscriberRegistry>,
        page_limit: usize,
    ) -> Self {
        Self {
            id,
            trip_id,
            user_id,
            rx,
            pending: VecDeque::new(),
            last_seen,
            store,
            registry,
            page_limit: page_limit.max(1),
            failed: false,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Highest message id handed out so far.
    pub fn last_seen(&self) -> MessageId {
        self.last_seen
    }

    pub(super) fn push(&mut self, frame: ServerFrame) {
        self.pending.push_back(frame);
    }

    /// Queue every stored message in `(last_seen, through]`.
    pub(super) async fn catch_up(&mut self, through: MessageId) -> Result<(), DomainError> {
        while self.last_seen < through {
            let page = self
                .store
                .history(&self.trip_id, self.last_seen, self.page_limit)
                .await?;
            let Some(last) = page.last().map(|m| m.message_id) else {
                break;
            };
            for message in page.into_iter().take_while(|m| m.message_id <= through) {
                self.queue_message(message);
            }
            if last >= through {
                break;
            }
        }
        Ok(())
    }

    /// Next frame for the client.
    ///
    /// `None` means the connection was evicted (its queue overflowed) or
    /// could not be kept gap-free; the client should reconnect with
    /// `since = last_seen()`.
    pub async fn next_frame(&mut self) -> Option<ServerFrame> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Some(frame);
            }
            if self.failed {
                return None;
            }

            let frame = self.rx.recv().await?;
            let Some(id) = frame.message_id() else {
                return Some(frame);
            };
            if id <= self.last_seen {
                debug!("{} dropped duplicate message {}", self.id, id);
                continue;
            }

            if id > self.last_seen.next() {
                debug!(
                    "{} filling gap {}..{} from history",
                    self.id, self.last_seen, id
                );
                if let Err(err) = self.catch_up(MessageId::new(id.value() - 1)).await {
                    warn!("{} could not fill gap: {}", self.id, err);
                    self.failed = true;
                    return Some(ServerFrame::error(ChannelErrorCode::Internal, err.to_string()));
                }
            }
            if let ServerFrame::Message { message } = frame {
                self.queue_message(message);
            }
        }
    }

    fn queue_message(&mut self, message: ChatMessage) {
        if message.message_id <= self.last_seen {
            return;
        }
        self.last_seen = message.message_id;
        self.pending.push_back(ServerFrame::Message { message });
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        self.registry.deregister(&self.trip_id, self.id);
    }
}
