//! Persistence ports
//!
//! Every mutation that must be serialized per key is expressed as a
//! compare-and-swap against the backing store instead of an in-process lock,
//! so the same use cases stay correct when several service processes share
//! one store. A lost race surfaces as [`StoreError::Conflict`]; use cases
//! re-read and retry.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use vibecation_domain::{
    ChatMessage, CompletionRecord, DecisionSnapshot, DomainError, MessageId, NewChatMessage,
    OptionId, OptionKind, OptionTally, Phase, Polarity, SuggestionSet, Trip, TripId, TripStatus,
    UserId, VoteKey, VoteOption, VoteTransition,
};

/// Errors that can occur in store adapters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Expected state no longer matches; re-read and retry
    #[error("Compare-and-swap conflict on {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(what) => DomainError::Conflict(what),
            StoreError::NotFound(what) => DomainError::NotFound(what),
            StoreError::Unavailable(reason) => DomainError::DownstreamFailure(reason),
        }
    }
}

/// A stored value together with the version a compare-and-swap must name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }
}

/// Input for trip creation
#[derive(Debug, Clone, Default)]
pub struct NewTrip {
    /// Caller-chosen id; the store allocates `trip_NNN` when absent
    pub id: Option<TripId>,
    pub title: String,
    pub description: String,
    pub members: Vec<UserId>,
}

/// Trip and membership metadata (an external collaborator of the core)
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn trip(&self, trip_id: &TripId) -> Result<Option<Trip>, StoreError>;

    /// Create a trip owned by `owner`; `Conflict` if the id is taken.
    async fn create_trip(&self, owner: &UserId, new_trip: NewTrip) -> Result<Trip, StoreError>;

    async fn set_status(&self, trip_id: &TripId, status: TripStatus) -> Result<(), StoreError>;
}

/// Vote rows and the poll tallies derived from them
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Current polarity of one vote row
    async fn current(&self, key: &VoteKey) -> Result<Option<Polarity>, StoreError>;

    /// Atomically apply `transition` to the row at `key` and its delta to
    /// the option's tally.
    ///
    /// Fails with `Conflict`, changing nothing, when the row no longer holds
    /// `transition.expected`.
    async fn commit(&self, key: &VoteKey, transition: &VoteTransition) -> Result<(), StoreError>;

    /// Tallies of every voted option of a kind
    async fn tallies(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, OptionTally>, StoreError>;

    /// One member's polarities for a kind
    async fn polarities(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, Polarity>, StoreError>;
}

/// The trip's derived option catalogue
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Replace the whole catalogue (idempotent for identical input)
    async fn replace_options(
        &self,
        trip_id: &TripId,
        options: Vec<VoteOption>,
    ) -> Result<(), StoreError>;

    /// Options of a kind in creation order
    async fn options(&self, trip_id: &TripId, kind: OptionKind)
    -> Result<Vec<VoteOption>, StoreError>;

    async fn option(
        &self,
        trip_id: &TripId,
        option_id: &OptionId,
    ) -> Result<Option<VoteOption>, StoreError>;
}

/// Completion records, one per (trip, phase)
#[async_trait]
pub trait CompletionStore: Send + Sync {
    async fn load(
        &self,
        trip_id: &TripId,
        phase: Phase,
    ) -> Result<Option<Versioned<CompletionRecord>>, StoreError>;

    /// Write `record` if the stored version equals `expected`
    /// (`None` = no record yet). Returns the new version.
    async fn compare_and_swap(
        &self,
        record: &CompletionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;
}

/// Suggestion sets, one per (trip, user)
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    async fn load(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
    ) -> Result<Option<Versioned<SuggestionSet>>, StoreError>;

    async fn compare_and_swap(
        &self,
        set: &SuggestionSet,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;

    /// Every submitted set of a trip
    async fn submitted(&self, trip_id: &TripId) -> Result<Vec<SuggestionSet>, StoreError>;
}

/// One decision snapshot per trip, overwritten on every finalize
#[async_trait]
pub trait DecisionStore: Send + Sync {
    async fn put(&self, snapshot: &DecisionSnapshot) -> Result<(), StoreError>;

    async fn get(&self, trip_id: &TripId) -> Result<Option<DecisionSnapshot>, StoreError>;
}

/// Persisted chat history
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Allocate the next message id of the trip and persist, atomically.
    ///
    /// Once this returns id `n`, every id below `n` is already readable.
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError>;

    /// Messages with id > `since`, ascending, at most `limit`
    async fn history(
        &self,
        trip_id: &TripId,
        since: MessageId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Highest allocated id, or `MessageId::ZERO`
    async fn latest_id(&self, trip_id: &TripId) -> Result<MessageId, StoreError>;
}
