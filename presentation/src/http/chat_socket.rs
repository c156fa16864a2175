//! WebSocket chat endpoint.
//!
//! After the upgrade the socket is split in two:
//!
//! - an outbound task owns the [`ChatConnection`] and writes every frame it
//!   yields; when the connection is evicted it sends a `lagged` error and
//!   ends
//! - the request task reads [`ClientFrame`]s and turns `send` frames into
//!   [`ChatService::send`] calls
//!
//! Whichever side finishes first ends the session. Dropping the connection
//! removes it from the registry.

use super::error::channel_code;
use super::state::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use vibecation_application::{ChatConnection, ChatService};
use vibecation_domain::{
    ChannelErrorCode, ClientFrame, DomainError, MessageId, ServerFrame, TripId, UserId,
};

type Outbound = Arc<Mutex<SplitSink<WebSocket, Message>>>;

#[derive(Debug, Deserialize)]
pub struct ChatQuery {
    pub user: UserId,
    #[serde(default)]
    pub since: Option<MessageId>,
}

pub async fn chat_socket(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Query(query): Query<ChatQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    let chat = state.chat.clone();
    ws.on_upgrade(move |socket| run_session(chat, trip_id, query, socket))
}

async fn run_session(chat: Arc<ChatService>, trip_id: TripId, query: ChatQuery, socket: WebSocket) {
    let (sink, mut incoming) = socket.split();
    let sink: Outbound = Arc::new(Mutex::new(sink));

    let connection = match chat.connect(&trip_id, &query.user, query.since).await {
        Ok(connection) => connection,
        Err(err) => {
            debug!("Rejected chat connect of {} to {}: {}", query.user, trip_id, err);
            let _ = send_frame(&sink, &ServerFrame::error(channel_code(&err), err.to_string())).await;
            let _ = sink.lock().await.close().await;
            return;
        }
    };
    let connection_id = connection.id();

    let mut outbound = tokio::spawn(pump_frames(connection, sink.clone()));

    loop {
        let message = tokio::select! {
            _ = &mut outbound => break,
            message = incoming.next() => message,
        };
        let text = match message {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => continue,
            Some(Err(err)) => {
                debug!("{} socket error: {}", connection_id, err);
                break;
            }
        };

        let frame = match serde_json::from_str::<ClientFrame>(&text) {
            Ok(frame) => frame,
            Err(err) => {
                let reply = ServerFrame::error(ChannelErrorCode::InvalidFrame, err.to_string());
                if send_frame(&sink, &reply).await.is_err() {
                    break;
                }
                continue;
            }
        };

        match frame {
            ClientFrame::Ping => {}
            ClientFrame::Send {
                content,
                correlation,
            } => {
                // The stored message comes back through the broadcast.
                if let Err(err) = chat.send(&trip_id, &query.user, &content, correlation).await {
                    let reply = ServerFrame::error(channel_code(&err), err.to_string());
                    let revoked = matches!(err, DomainError::Unauthorized { .. });
                    if send_frame(&sink, &reply).await.is_err() || revoked {
                        break;
                    }
                }
            }
        }
    }

    outbound.abort();
    let _ = sink.lock().await.close().await;
    info!("{} left {} chat ({})", query.user, trip_id, connection_id);
}

/// Forward connection frames until eviction or a write failure.
async fn pump_frames(mut connection: ChatConnection, sink: Outbound) {
    while let Some(frame) = connection.next_frame().await {
        if send_frame(&sink, &frame).await.is_err() {
            return;
        }
    }
    let lagged = ServerFrame::error(
        ChannelErrorCode::Lagged,
        format!("reconnect with since={}", connection.last_seen()),
    );
    let _ = send_frame(&sink, &lagged).await;
}

async fn send_frame(sink: &Outbound, frame: &ServerFrame) -> Result<(), axum::Error> {
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(err) => return Err(axum::Error::new(err)),
    };
    sink.lock().await.send(Message::Text(text)).await
}
