//! Messaging channel
//!
//! ```text
//!  send ─▶ ChatStore.append ─▶ MessageBroker.publish
//!                                     │ (every process)
//!                                     ▼
//!                 ChatHub ─▶ SubscriberRegistry.deliver ─▶ ChatConnection
//! ```
//!
//! [`ChatService`] is the entry point for the boundary. [`ChatHub`] runs once
//! per process and [`ChatConnection`] is held by one client socket.

mod connection;
mod hub;
mod service;

pub use connection::ChatConnection;
pub use hub::ChatHub;
pub use service::ChatService;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChatParams;
    use crate::ports::message_broker::{
        BrokerEnvelope, BrokerError, BrokerStream, MessageBroker,
    };
    use crate::ports::phase_notifier::PhaseNotifier;
    use crate::ports::store::{ChatStore, StoreError};
    use crate::ports::subscriber_registry::{LocalSubscriberRegistry, SubscriberRegistry};
    use crate::use_cases::test_support::MemoryStore;
    use async_trait::async_trait;
    use futures::channel::mpsc::{UnboundedSender, unbounded};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use vibecation_domain::{
        ChannelErrorCode, ChatMessage, CorrelationToken, DomainError, MessageId, NewChatMessage,
        Phase, PhaseStatus, ServerFrame, TripId, UserId,
    };

    /// Fans every publish out to all subscriber streams.
    #[derive(Default)]
    struct LoopbackBroker {
        subscribers: Mutex<Vec<UnboundedSender<BrokerEnvelope>>>,
    }

    impl MessageBroker for LoopbackBroker {
        fn publish(&self, trip_id: &TripId, frame: ServerFrame) -> Result<(), BrokerError> {
            let envelope = BrokerEnvelope {
                trip_id: trip_id.clone(),
                frame,
            };
            self.subscribers
                .lock()
                .unwrap()
                .retain(|tx| tx.unbounded_send(envelope.clone()).is_ok());
            Ok(())
        }

        fn subscribe(&self) -> BrokerStream {
            let (tx, rx) = unbounded();
            self.subscribers.lock().unwrap().push(tx);
            Box::pin(rx)
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        broker: Arc<LoopbackBroker>,
        registry: Arc<LocalSubscriberRegistry>,
        service: ChatService,
        hub: ChatHub,
    }

    fn fixture(params: ChatParams) -> Fixture {
        let store = Arc::new(MemoryStore::with_trip("trip_1", &["a", "b"]));
        let broker = Arc::new(LoopbackBroker::default());
        let registry = Arc::new(LocalSubscriberRegistry::new());
        let hub = ChatHub::spawn(broker.as_ref(), registry.clone(), CancellationToken::new());
        let service = ChatService::new(store.clone(), store.clone(), broker.clone(), registry.clone())
            .with_params(params);
        Fixture {
            store,
            broker,
            registry,
            service,
            hub,
        }
    }

    fn trip() -> TripId {
        TripId::new("trip_1")
    }

    async fn next(conn: &mut ChatConnection) -> ServerFrame {
        tokio::time::timeout(Duration::from_secs(2), conn.next_frame())
            .await
            .expect("frame in time")
            .expect("connection open")
    }

    async fn next_message_id(conn: &mut ChatConnection) -> u64 {
        match next(conn).await {
            ServerFrame::Message { message } => message.message_id.value(),
            other => panic!("expected message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_welcome_then_live_messages_to_every_connection() {
        let f = fixture(ChatParams::default());
        let a = UserId::new("a");
        let mut first = f.service.connect(&trip(), &a, None).await.unwrap();
        let mut second = f.service.connect(&trip(), &a, None).await.unwrap();
        let mut other = f.service.connect(&trip(), &UserId::new("b"), None).await.unwrap();

        for conn in [&mut first, &mut second, &mut other] {
            assert!(matches!(next(conn).await, ServerFrame::Welcome { .. }));
        }

        let token = CorrelationToken::new("tmp-1");
        let sent = f
            .service
            .send(&trip(), &a, "hola", Some(token.clone()))
            .await
            .unwrap();
        assert_eq!(sent.message_id, MessageId::new(1));

        for conn in [&mut first, &mut second, &mut other] {
            match next(conn).await {
                ServerFrame::Message { message } => {
                    assert_eq!(message.content, "hola");
                    assert_eq!(message.correlation.as_ref(), Some(&token));
                }
                frame => panic!("unexpected {:?}", frame),
            }
        }
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnect_with_since_replays_without_gaps() {
        let f = fixture(ChatParams::default());
        let a = UserId::new("a");
        for n in 1..=7 {
            f.service.send(&trip(), &a, &format!("m{}", n), None).await.unwrap();
        }

        let mut conn = f
            .service
            .connect(&trip(), &UserId::new("b"), Some(MessageId::new(5)))
            .await
            .unwrap();
        match next(&mut conn).await {
            ServerFrame::Welcome {
                last_message_id, ..
            } => assert_eq!(last_message_id, MessageId::new(7)),
            frame => panic!("unexpected {:?}", frame),
        }
        assert_eq!(next_message_id(&mut conn).await, 6);
        assert_eq!(next_message_id(&mut conn).await, 7);

        f.service.send(&trip(), &a, "m8", None).await.unwrap();
        assert_eq!(next_message_id(&mut conn).await, 8);
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_duplicates_dropped_and_gaps_filled() {
        let f = fixture(ChatParams::default());
        let mut conn = f.service.connect(&trip(), &UserId::new("b"), None).await.unwrap();
        next(&mut conn).await;

        // Append directly so the broker never sees ids 1 and 2.
        for content in ["one", "two"] {
            let draft =
                NewChatMessage::new(trip(), UserId::new("a"), content, None).unwrap();
            f.store.append(draft).await.unwrap();
        }
        let third = f
            .service
            .send(&trip(), &UserId::new("a"), "three", None)
            .await
            .unwrap();
        // Redelivery of the same frame is ignored.
        f.broker
            .publish(&trip(), ServerFrame::Message { message: third })
            .unwrap();
        f.service.send(&trip(), &UserId::new("a"), "four", None).await.unwrap();

        let ids = [
            next_message_id(&mut conn).await,
            next_message_id(&mut conn).await,
            next_message_id(&mut conn).await,
            next_message_id(&mut conn).await,
        ];
        assert_eq!(ids, [1, 2, 3, 4]);
        f.hub.shutdown().await;
    }

    /// Appends and broadcasts a message from inside the second `latest_id`
    /// read, as a concurrent `send` landing mid-connect would.
    struct SendDuringConnect {
        inner: Arc<MemoryStore>,
        broker: Arc<LoopbackBroker>,
        latest_reads: AtomicUsize,
    }

    #[async_trait]
    impl ChatStore for SendDuringConnect {
        async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError> {
            self.inner.append(message).await
        }

        async fn history(
            &self,
            trip_id: &TripId,
            since: MessageId,
            limit: usize,
        ) -> Result<Vec<ChatMessage>, StoreError> {
            self.inner.history(trip_id, since, limit).await
        }

        async fn latest_id(&self, trip_id: &TripId) -> Result<MessageId, StoreError> {
            if self.latest_reads.fetch_add(1, Ordering::SeqCst) == 1 {
                let draft = NewChatMessage::new(trip(), UserId::new("a"), "racing", None).unwrap();
                let message = self.inner.append(draft).await?;
                self.broker
                    .publish(trip_id, ServerFrame::Message { message })
                    .unwrap();
            }
            self.inner.latest_id(trip_id).await
        }
    }

    #[tokio::test]
    async fn test_message_sent_while_connecting_is_delivered_once() {
        let f = fixture(ChatParams::default());
        let racing = Arc::new(SendDuringConnect {
            inner: f.store.clone(),
            broker: f.broker.clone(),
            latest_reads: AtomicUsize::new(0),
        });
        let service = ChatService::new(
            f.store.clone(),
            racing,
            f.broker.clone(),
            f.registry.clone(),
        );

        let mut conn = service.connect(&trip(), &UserId::new("b"), None).await.unwrap();
        match next(&mut conn).await {
            ServerFrame::Welcome {
                last_message_id, ..
            } => assert_eq!(last_message_id, MessageId::ZERO),
            frame => panic!("unexpected {:?}", frame),
        }
        assert_eq!(next_message_id(&mut conn).await, 1);

        service.send(&trip(), &UserId::new("a"), "after", None).await.unwrap();
        assert_eq!(next_message_id(&mut conn).await, 2);
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_non_member_cannot_connect_or_send() {
        let f = fixture(ChatParams::default());
        let stranger = UserId::new("mallory");
        assert!(matches!(
            f.service.connect(&trip(), &stranger, None).await,
            Err(DomainError::Unauthorized { .. })
        ));
        assert!(matches!(
            f.service.send(&trip(), &stranger, "hi", None).await,
            Err(DomainError::Unauthorized { .. })
        ));
        assert_eq!(f.registry.connection_count(&trip()), 0);
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_drop_deregisters_only_that_connection() {
        let f = fixture(ChatParams::default());
        let a = UserId::new("a");
        let first = f.service.connect(&trip(), &a, None).await.unwrap();
        let _second = f.service.connect(&trip(), &a, None).await.unwrap();
        assert_eq!(f.registry.user_connection_count(&trip(), &a), 2);

        drop(first);
        assert_eq!(f.registry.user_connection_count(&trip(), &a), 1);
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_lagging_connection_is_evicted() {
        let params = ChatParams {
            connection_buffer: 1,
            ..ChatParams::default()
        };
        let f = fixture(params);
        let mut conn = f.service.connect(&trip(), &UserId::new("b"), None).await.unwrap();
        for n in 0..3 {
            f.service
                .send(&trip(), &UserId::new("a"), &format!("m{}", n), None)
                .await
                .unwrap();
        }
        // Let the hub drain the broker into the full queue.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut frames = Vec::new();
        while let Ok(Some(frame)) =
            tokio::time::timeout(Duration::from_millis(200), conn.next_frame()).await
        {
            frames.push(frame);
        }
        assert!(matches!(frames[0], ServerFrame::Welcome { .. }));
        assert!(frames.len() < 4);
        assert_eq!(f.registry.connection_count(&trip()), 0);
        f.hub.shutdown().await;
    }

    #[tokio::test]
    async fn test_history_clamps_limit_and_phase_frames_are_pushed() {
        let f = fixture(ChatParams {
            max_history_limit: 2,
            ..ChatParams::default()
        });
        let a = UserId::new("a");
        for n in 0..4 {
            f.service.send(&trip(), &a, &format!("m{}", n), None).await.unwrap();
        }
        let page = f.service.history(&trip(), Some(MessageId::new(1)), Some(50)).await.unwrap();
        let ids: Vec<u64> = page.iter().map(|m| m.message_id.value()).collect();
        assert_eq!(ids, vec![2, 3]);

        let mut conn = f.service.connect(&trip(), &a, None).await.unwrap();
        next(&mut conn).await;
        let status = PhaseStatus {
            phase: Phase::Brainstorm,
            completed_count: 1,
            total_members: 2,
            phase_complete: false,
            finalized: false,
        };
        f.service.on_status_changed(&trip(), &status);
        f.service.on_phase_finalized(&trip(), Phase::Brainstorm);
        assert!(matches!(next(&mut conn).await, ServerFrame::PhaseStatus { .. }));
        assert!(matches!(
            next(&mut conn).await,
            ServerFrame::PhaseComplete {
                phase: Phase::Brainstorm,
                ..
            }
        ));
        assert_eq!(
            ServerFrame::error(ChannelErrorCode::Unauthorized, "x"),
            ServerFrame::Error {
                code: ChannelErrorCode::Unauthorized,
                message: "x".into(),
                refresh_membership: true,
            }
        );
        f.hub.shutdown().await;
    }
}
