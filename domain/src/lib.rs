//! Domain layer for vibecation
//!
//! This crate contains the core business logic, entities, and value objects
//! of a collaborative trip decision session. It has no dependencies on
//! storage, transport or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session flow
//!
//! ```text
//!  brainstorm ──(all members done)──▶ options derived ──▶ polling
//!                                                          │
//!                     decision snapshot ◀──(all members done)
//! ```
//!
//! - **Vote ledger**: one [`Polarity`] per (trip, user, option, kind) with
//!   toggle semantics ([`VoteTransition`])
//! - **Poll aggregation**: incremental [`OptionTally`] counters and a
//!   deterministic ranking ([`rank_options`])
//! - **Completion gate**: [`CompletionRecord`] per (trip, phase)
//! - **Decision**: [`DecisionSnapshot`] derived under a [`DecisionPolicy`]
//! - **Chat**: [`ChatMessage`] and the [`ServerFrame`]/[`ClientFrame`] protocol

pub mod chat;
pub mod core;
pub mod decision;
pub mod option;
pub mod phase;
pub mod poll;
pub mod suggestion;
pub mod trip;
pub mod vote;

// Re-export commonly used types
pub use chat::{
    ChannelErrorCode, ChatMessage, ClientFrame, CorrelationToken, NewChatMessage, ServerFrame,
};
pub use core::{
    error::DomainError,
    ids::{MessageId, OptionId, TripId, UserId},
};
pub use decision::{DecisionPolicy, DecisionSnapshot};
pub use option::{OptionKind, VoteOption, derive_catalogue};
pub use phase::{CompletionRecord, Phase, PhaseStatus};
pub use poll::{OptionTally, RankedOption, rank_options};
pub use suggestion::{
    Activity, ActivityType, CandidateSet, ItineraryDay, SuggestionSet, SuggestionStatus,
};
pub use trip::{Trip, TripStatus};
pub use vote::{CastOutcome, Polarity, TallyDelta, VoteAction, VoteKey, VoteTransition};
