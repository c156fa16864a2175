//! HTTP and WebSocket boundary (axum)
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/trips` | [`handlers::create_trip`] |
//! | GET | `/trips/:trip` | [`handlers::trip_info`] |
//! | POST | `/trips/:trip/votes` | [`handlers::vote`] |
//! | GET | `/trips/:trip/polls/:kind?user=` | [`handlers::poll`] |
//! | GET | `/trips/:trip/options/:kind` | [`handlers::list_options`] |
//! | POST | `/trips/:trip/phases/:phase/complete` | [`handlers::mark_complete`] |
//! | GET | `/trips/:trip/phases/:phase` | [`handlers::phase_status`] |
//! | GET | `/trips/:trip/decision` | [`handlers::decision`] |
//! | PUT, GET | `/trips/:trip/suggestions/:user` | [`handlers::save_draft`], [`handlers::get_suggestion`] |
//! | POST | `/trips/:trip/suggestions/:user/submit` | [`handlers::submit_suggestion`] |
//! | POST | `/trips/:trip/suggestions/:user/generate` | [`handlers::generate_draft`] |
//! | GET | `/trips/:trip/messages?since=&limit=` | [`handlers::history`] |
//! | GET (ws) | `/trips/:trip/chat?user=&since=` | [`chat_socket::chat_socket`] |
//! | GET | `/healthz` | [`handlers::healthz`] |

pub mod chat_socket;
pub mod error;
pub mod handlers;
mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::Router;
use axum::routing::{get, post};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/trips", post(handlers::create_trip))
        .route("/trips/:trip", get(handlers::trip_info))
        .route("/trips/:trip/votes", post(handlers::vote))
        .route("/trips/:trip/polls/:kind", get(handlers::poll))
        .route("/trips/:trip/options/:kind", get(handlers::list_options))
        .route(
            "/trips/:trip/phases/:phase/complete",
            post(handlers::mark_complete),
        )
        .route("/trips/:trip/phases/:phase", get(handlers::phase_status))
        .route("/trips/:trip/decision", get(handlers::decision))
        .route(
            "/trips/:trip/suggestions/:user",
            get(handlers::get_suggestion).put(handlers::save_draft),
        )
        .route(
            "/trips/:trip/suggestions/:user/submit",
            post(handlers::submit_suggestion),
        )
        .route(
            "/trips/:trip/suggestions/:user/generate",
            post(handlers::generate_draft),
        )
        .route("/trips/:trip/messages", get(handlers::history))
        .route("/trips/:trip/chat", get(chat_socket::chat_socket))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::handlers::*;
    use super::*;
    use axum::Json;
    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use std::sync::Arc;
    use vibecation_application::{
        CastVoteUseCase, ChatService, CompletePhaseUseCase, DecisionFinalizer,
        LocalSubscriberRegistry, OptionDerivation, PollUseCase, SuggestionUseCase, TripUseCase,
    };
    use std::net::SocketAddr;
    use vibecation_domain::{
        DomainError, OptionId, OptionKind, Phase, Polarity, TripId, UserId, VoteAction,
    };
    use vibecation_infrastructure::{InMemoryStore, InProcessBroker, SampleItineraryGenerator};

    fn state() -> AppState {
        let store = Arc::new(InMemoryStore::new());
        let broker = Arc::new(InProcessBroker::new(16));
        let registry = Arc::new(LocalSubscriberRegistry::new());
        let polls = Arc::new(PollUseCase::new(store.clone(), store.clone(), store.clone()));
        let decisions = Arc::new(DecisionFinalizer::new(store.clone(), polls.clone(), store.clone()));
        let phases = CompletePhaseUseCase::new(store.clone(), store.clone())
            .with_action(
                Phase::Brainstorm,
                Arc::new(OptionDerivation::new(store.clone(), store.clone())),
            )
            .with_action(Phase::Polling, decisions.clone());

        AppState {
            trips: Arc::new(TripUseCase::new(store.clone())),
            votes: Arc::new(CastVoteUseCase::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            polls,
            phases: Arc::new(phases),
            decisions,
            suggestions: Arc::new(SuggestionUseCase::new(
                store.clone(),
                store.clone(),
                store.clone(),
                Arc::new(SampleItineraryGenerator::new()),
            )),
            chat: Arc::new(ChatService::new(store.clone(), store, broker, registry)),
        }
    }

    async fn new_trip(state: &AppState, members: &[&str]) -> TripId {
        let request = CreateTripRequest {
            trip_id: None,
            owner: UserId::new("ana"),
            title: "Lisbon".into(),
            description: String::new(),
            members: members.iter().map(|m| UserId::new(*m)).collect(),
        };
        let (status, Json(trip)) = create_trip(State(state.clone()), Json(request))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        trip.id
    }

    fn member(user: &str) -> Json<MemberRequest> {
        Json(MemberRequest {
            user_id: UserId::new(user),
        })
    }

    #[test]
    fn test_router_builds() {
        let _ = router(state());
    }

    #[tokio::test]
    async fn test_vote_flow_through_handlers() {
        let state = state();
        let trip = new_trip(&state, &["ben"]).await;

        for user in ["ana", "ben"] {
            generate_draft(
                State(state.clone()),
                Path((trip.clone(), UserId::new(user))),
                Json(GenerateRequest {
                    query: "2 days in Lisbon".into(),
                }),
            )
            .await
            .unwrap();
            submit_suggestion(State(state.clone()), Path((trip.clone(), UserId::new(user))))
                .await
                .unwrap();
            mark_complete(
                State(state.clone()),
                Path((trip.clone(), "brainstorm".to_string())),
                member(user),
            )
            .await
            .unwrap();
        }

        let Json(options) = list_options(
            State(state.clone()),
            Path((trip.clone(), "location".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(options.len(), 1);

        let Json(outcome) = vote(
            State(state.clone()),
            Path(trip.clone()),
            Json(VoteRequest {
                user_id: UserId::new("ben"),
                option_id: options[0].id.clone(),
                kind: OptionKind::Location,
                polarity: Polarity::Up,
            }),
        )
        .await
        .unwrap();
        assert_eq!(outcome.action, VoteAction::Created);

        let Json(ranked) = poll(
            State(state.clone()),
            Path((trip.clone(), "location".to_string())),
            Query(UserQuery {
                user: UserId::new("ben"),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ranked[0].net_score, 1);
        assert_eq!(ranked[0].caller_polarity, Some(Polarity::Up));
    }

    #[tokio::test]
    async fn test_errors_map_to_statuses() {
        let state = state();
        let trip = new_trip(&state, &[]).await;

        let err = trip_info(State(state.clone()), Path(TripId::new("missing")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = vote(
            State(state.clone()),
            Path(trip.clone()),
            Json(VoteRequest {
                user_id: UserId::new("stranger"),
                option_id: OptionId::new("location_001"),
                kind: OptionKind::Location,
                polarity: Polarity::Down,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let err = decision(State(state.clone()), Path(trip.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err.0, DomainError::NotFound(_)));

        let Json(status) = phase_status(State(state.clone()), Path((trip, "polling".to_string())))
            .await
            .unwrap();
        assert_eq!(status.completed_count, 0);
        assert_eq!(status.total_members, 1);
    }

    #[tokio::test]
    async fn test_history_after_send() {
        let state = state();
        let trip = new_trip(&state, &[]).await;
        for text in ["hola", "que tal"] {
            state
                .chat
                .send(&trip, &UserId::new("ana"), text, None)
                .await
                .unwrap();
        }

        let Json(messages) = history(
            State(state.clone()),
            Path(trip),
            Query(HistoryQuery {
                since: None,
                limit: Some(1),
            }),
        )
        .await
        .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "hola");
    }

    async fn spawn_server(state: AppState) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_unknown_phase_or_kind_segment_is_not_found() {
        let state = state();
        let trip = new_trip(&state, &[]).await;
        let addr = spawn_server(state).await;
        let client = reqwest::Client::new();

        let paths = [
            format!("/trips/{}/phases/packing", trip),
            format!("/trips/{}/options/hotels", trip),
            format!("/trips/{}/polls/hotels?user=ana", trip),
            "/trips/missing/phases/polling".to_string(),
        ];
        for path in paths {
            let response = client
                .get(format!("http://{}{}", addr, path))
                .send()
                .await
                .unwrap();
            assert_eq!(response.status().as_u16(), 404, "{}", path);
            let body: serde_json::Value = response.json().await.unwrap();
            assert_eq!(body["error"], "not_found", "{}", path);
        }

        let response = client
            .post(format!("http://{}/trips/{}/phases/packing/complete", addr, trip))
            .json(&serde_json::json!({ "userId": "ana" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);

        // Aliases accepted by the parser reach the use case.
        let response = client
            .get(format!("http://{}/trips/{}/phases/poll", addr, trip))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let status: serde_json::Value = response.json().await.unwrap();
        assert_eq!(status["phase"], "polling");
    }
}
