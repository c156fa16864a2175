//! Shared handler state

use std::sync::Arc;
use vibecation_application::{
    CastVoteUseCase, ChatService, CompletePhaseUseCase, DecisionFinalizer, PollUseCase,
    SuggestionUseCase, TripUseCase,
};

/// Use cases reachable from the boundary, wired once by the binary
#[derive(Clone)]
pub struct AppState {
    pub trips: Arc<TripUseCase>,
    pub votes: Arc<CastVoteUseCase>,
    pub polls: Arc<PollUseCase>,
    pub phases: Arc<CompletePhaseUseCase>,
    pub decisions: Arc<DecisionFinalizer>,
    pub suggestions: Arc<SuggestionUseCase>,
    pub chat: Arc<ChatService>,
}
