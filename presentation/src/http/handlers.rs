//! REST handlers
//!
//! Each handler extracts its inputs, calls one use case and returns JSON.
//! The acting member comes from the request body or the `user` query
//! parameter; authentication sits in front of this service.
//!
//! Phase and option-kind segments are taken as plain strings and parsed
//! here, so an unknown name is a JSON `not_found` like an unknown trip.

use super::error::ApiError;
use super::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use vibecation_application::{CastVoteInput, NewTrip};
use vibecation_domain::{
    CandidateSet, CastOutcome, ChatMessage, DecisionSnapshot, MessageId, OptionId, OptionKind,
    Phase, PhaseStatus, Polarity, RankedOption, SuggestionSet, Trip, TripId, UserId, VoteOption,
};

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    /// Caller-chosen id; allocated when absent
    #[serde(default)]
    pub trip_id: Option<TripId>,
    pub owner: UserId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<UserId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub user_id: UserId,
    pub option_id: OptionId,
    pub kind: OptionKind,
    pub polarity: Polarity,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub user_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user: UserId,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub since: Option<MessageId>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

pub async fn healthz() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn create_trip(
    State(state): State<AppState>,
    Json(request): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let new_trip = NewTrip {
        id: request.trip_id,
        title: request.title,
        description: request.description,
        members: request.members,
    };
    let trip = state.trips.create_trip(&request.owner, new_trip).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

pub async fn trip_info(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
) -> ApiResult<Trip> {
    Ok(Json(state.trips.trip_info(&trip_id).await?))
}

pub async fn vote(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Json(request): Json<VoteRequest>,
) -> ApiResult<CastOutcome> {
    let input = CastVoteInput::new(
        trip_id,
        request.user_id,
        request.option_id,
        request.kind,
        request.polarity,
    );
    Ok(Json(state.votes.execute(input).await?))
}

pub async fn poll(
    State(state): State<AppState>,
    Path((trip_id, kind)): Path<(TripId, String)>,
    Query(query): Query<UserQuery>,
) -> ApiResult<Vec<RankedOption>> {
    let kind: OptionKind = kind.parse()?;
    Ok(Json(state.polls.poll(&trip_id, &query.user, kind).await?))
}

pub async fn list_options(
    State(state): State<AppState>,
    Path((trip_id, kind)): Path<(TripId, String)>,
) -> ApiResult<Vec<VoteOption>> {
    let kind: OptionKind = kind.parse()?;
    Ok(Json(state.polls.list_options(&trip_id, kind).await?))
}

pub async fn mark_complete(
    State(state): State<AppState>,
    Path((trip_id, phase)): Path<(TripId, String)>,
    Json(request): Json<MemberRequest>,
) -> ApiResult<PhaseStatus> {
    let phase: Phase = phase.parse()?;
    let status = state
        .phases
        .mark_complete(&trip_id, &request.user_id, phase)
        .await?;
    Ok(Json(status))
}

pub async fn phase_status(
    State(state): State<AppState>,
    Path((trip_id, phase)): Path<(TripId, String)>,
) -> ApiResult<PhaseStatus> {
    let phase: Phase = phase.parse()?;
    Ok(Json(state.phases.phase_status(&trip_id, phase).await?))
}

pub async fn decision(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
) -> ApiResult<DecisionSnapshot> {
    Ok(Json(state.decisions.snapshot(&trip_id).await?))
}

pub async fn save_draft(
    State(state): State<AppState>,
    Path((trip_id, user_id)): Path<(TripId, UserId)>,
    Json(candidates): Json<CandidateSet>,
) -> ApiResult<SuggestionSet> {
    let set = state
        .suggestions
        .save_draft(&trip_id, &user_id, candidates)
        .await?;
    Ok(Json(set))
}

pub async fn get_suggestion(
    State(state): State<AppState>,
    Path((trip_id, user_id)): Path<(TripId, UserId)>,
) -> ApiResult<SuggestionSet> {
    Ok(Json(state.suggestions.get(&trip_id, &user_id).await?))
}

pub async fn submit_suggestion(
    State(state): State<AppState>,
    Path((trip_id, user_id)): Path<(TripId, UserId)>,
) -> ApiResult<SuggestionSet> {
    Ok(Json(state.suggestions.submit(&trip_id, &user_id).await?))
}

pub async fn generate_draft(
    State(state): State<AppState>,
    Path((trip_id, user_id)): Path<(TripId, UserId)>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<SuggestionSet> {
    let set = state
        .suggestions
        .generate_draft(&trip_id, &user_id, &request.query)
        .await?;
    Ok(Json(set))
}

pub async fn history(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<ChatMessage>> {
    let messages = state
        .chat
        .history(&trip_id, query.since, query.limit)
        .await?;
    Ok(Json(messages))
}
