//! In-memory store implementing every persistence port.
//!
//! State is sharded per trip: a trip-map lock is held only long enough to
//! find (or create) the trip's shard, and each shard has its own mutex.
//! Every port method runs its compare-and-swap inside one shard critical
//! section with no `.await` in between, which is what makes it atomic.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use vibecation_application::{
    ChatStore, CompletionStore, DecisionStore, MembershipDirectory, NewTrip, OptionStore,
    StoreError, SuggestionStore, Versioned, VoteStore,
};
use vibecation_domain::{
    ChatMessage, CompletionRecord, DecisionSnapshot, MessageId, NewChatMessage, OptionId,
    OptionKind, OptionTally, Phase, Polarity, SuggestionSet, Trip, TripId, TripStatus, UserId,
    VoteKey, VoteOption, VoteTransition,
};

/// Everything stored for one trip
#[derive(Default)]
struct TripShard {
    trip: Option<Trip>,
    votes: HashMap<VoteKey, Polarity>,
    tallies: HashMap<OptionId, OptionTally>,
    options: Vec<VoteOption>,
    completions: HashMap<Phase, Versioned<CompletionRecord>>,
    suggestions: HashMap<UserId, Versioned<SuggestionSet>>,
    decision: Option<DecisionSnapshot>,
    messages: Vec<ChatMessage>,
}

#[derive(Default)]
pub struct InMemoryStore {
    shards: RwLock<HashMap<TripId, Arc<Mutex<TripShard>>>>,
    trip_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing shard, if the trip id has ever been touched.
    async fn shard(&self, trip_id: &TripId) -> Option<Arc<Mutex<TripShard>>> {
        self.shards.read().await.get(trip_id).cloned()
    }

    async fn shard_or_create(&self, trip_id: &TripId) -> Arc<Mutex<TripShard>> {
        if let Some(shard) = self.shard(trip_id).await {
            return shard;
        }
        self.shards
            .write()
            .await
            .entry(trip_id.clone())
            .or_default()
            .clone()
    }

    /// Next free `trip_NNN` id.
    async fn allocate_trip_id(&self) -> TripId {
        let shards = self.shards.read().await;
        loop {
            let seq = self.trip_seq.fetch_add(1, Ordering::SeqCst) + 1;
            let id = TripId::sequential(seq);
            if !shards.contains_key(&id) {
                return id;
            }
        }
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryStore {
    async fn trip(&self, trip_id: &TripId) -> Result<Option<Trip>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(None);
        };
        Ok(shard.lock().await.trip.clone())
    }

    async fn create_trip(&self, owner: &UserId, new_trip: NewTrip) -> Result<Trip, StoreError> {
        let id = match new_trip.id {
            Some(id) => id,
            None => self.allocate_trip_id().await,
        };
        let shard = self.shard_or_create(&id).await;
        let mut shard = shard.lock().await;
        if shard.trip.is_some() {
            return Err(StoreError::Conflict(format!("trip {} already exists", id)));
        }

        let trip = Trip::new(id, new_trip.title, owner.clone(), new_trip.members)
            .with_description(new_trip.description);
        shard.trip = Some(trip.clone());
        debug!("Stored trip {}", trip.id);
        Ok(trip)
    }

    async fn set_status(&self, trip_id: &TripId, status: TripStatus) -> Result<(), StoreError> {
        let shard = self
            .shard(trip_id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("trip {}", trip_id)))?;
        let mut shard = shard.lock().await;
        let trip = shard
            .trip
            .as_mut()
            .ok_or_else(|| StoreError::NotFound(format!("trip {}", trip_id)))?;
        trip.status = status;
        Ok(())
    }
}

#[async_trait]
impl VoteStore for InMemoryStore {
    async fn current(&self, key: &VoteKey) -> Result<Option<Polarity>, StoreError> {
        let Some(shard) = self.shard(&key.trip_id).await else {
            return Ok(None);
        };
        Ok(shard.lock().await.votes.get(key).copied())
    }

    async fn commit(&self, key: &VoteKey, transition: &VoteTransition) -> Result<(), StoreError> {
        let shard = self.shard_or_create(&key.trip_id).await;
        let mut shard = shard.lock().await;

        if shard.votes.get(key).copied() != transition.expected {
            return Err(StoreError::Conflict(key.to_string()));
        }
        match transition.next {
            Some(polarity) => shard.votes.insert(key.clone(), polarity),
            None => shard.votes.remove(key),
        };
        shard
            .tallies
            .entry(key.option_id.clone())
            .or_default()
            .apply(transition.delta());
        Ok(())
    }

    async fn tallies(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, OptionTally>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(HashMap::new());
        };
        let shard = shard.lock().await;
        Ok(shard
            .options
            .iter()
            .filter(|o| o.kind == kind)
            .filter_map(|o| shard.tallies.get(&o.id).map(|t| (o.id.clone(), *t)))
            .collect())
    }

    async fn polarities(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, Polarity>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(HashMap::new());
        };
        let shard = shard.lock().await;
        Ok(shard
            .votes
            .iter()
            .filter(|(key, _)| &key.user_id == user_id && key.kind == kind)
            .map(|(key, polarity)| (key.option_id.clone(), *polarity))
            .collect())
    }
}

#[async_trait]
impl OptionStore for InMemoryStore {
    async fn replace_options(
        &self,
        trip_id: &TripId,
        mut options: Vec<VoteOption>,
    ) -> Result<(), StoreError> {
        options.sort_by_key(|o| o.seq);
        let shard = self.shard_or_create(trip_id).await;
        shard.lock().await.options = options;
        Ok(())
    }

    async fn options(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<Vec<VoteOption>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(Vec::new());
        };
        let shard = shard.lock().await;
        Ok(shard
            .options
            .iter()
            .filter(|o| o.kind == kind)
            .cloned()
            .collect())
    }

    async fn option(
        &self,
        trip_id: &TripId,
        option_id: &OptionId,
    ) -> Result<Option<VoteOption>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(None);
        };
        let shard = shard.lock().await;
        Ok(shard.options.iter().find(|o| &o.id == option_id).cloned())
    }
}

/// Version check shared by the versioned CAS ports.
fn check_version(
    what: impl FnOnce() -> String,
    stored: Option<u64>,
    expected: Option<u64>,
) -> Result<u64, StoreError> {
    if stored != expected {
        return Err(StoreError::Conflict(what()));
    }
    Ok(stored.unwrap_or(0) + 1)
}

#[async_trait]
impl CompletionStore for InMemoryStore {
    async fn load(
        &self,
        trip_id: &TripId,
        phase: Phase,
    ) -> Result<Option<Versioned<CompletionRecord>>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(None);
        };
        Ok(shard.lock().await.completions.get(&phase).cloned())
    }

    async fn compare_and_swap(
        &self,
        record: &CompletionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let shard = self.shard_or_create(&record.trip_id).await;
        let mut shard = shard.lock().await;
        let stored = shard.completions.get(&record.phase).map(|v| v.version);
        let version = check_version(
            || format!("{} completion of {}", record.phase, record.trip_id),
            stored,
            expected,
        )?;
        shard
            .completions
            .insert(record.phase, Versioned::new(record.clone(), version));
        Ok(version)
    }
}

#[async_trait]
impl SuggestionStore for InMemoryStore {
    async fn load(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
    ) -> Result<Option<Versioned<SuggestionSet>>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(None);
        };
        Ok(shard.lock().await.suggestions.get(user_id).cloned())
    }

    async fn compare_and_swap(
        &self,
        set: &SuggestionSet,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let shard = self.shard_or_create(&set.trip_id).await;
        let mut shard = shard.lock().await;
        let stored = shard.suggestions.get(&set.user_id).map(|v| v.version);
        let version = check_version(
            || format!("suggestions of {} in {}", set.user_id, set.trip_id),
            stored,
            expected,
        )?;
        shard
            .suggestions
            .insert(set.user_id.clone(), Versioned::new(set.clone(), version));
        Ok(version)
    }

    async fn submitted(&self, trip_id: &TripId) -> Result<Vec<SuggestionSet>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(Vec::new());
        };
        let shard = shard.lock().await;
        Ok(shard
            .suggestions
            .values()
            .filter(|v| v.value.is_submitted())
            .map(|v| v.value.clone())
            .collect())
    }
}

#[async_trait]
impl DecisionStore for InMemoryStore {
    async fn put(&self, snapshot: &DecisionSnapshot) -> Result<(), StoreError> {
        let shard = self.shard_or_create(&snapshot.trip_id).await;
        shard.lock().await.decision = Some(snapshot.clone());
        Ok(())
    }

    async fn get(&self, trip_id: &TripId) -> Result<Option<DecisionSnapshot>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(None);
        };
        Ok(shard.lock().await.decision.clone())
    }
}

#[async_trait]
impl ChatStore for InMemoryStore {
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError> {
        let shard = self.shard_or_create(&message.trip_id).await;
        let mut shard = shard.lock().await;
        let id = shard
            .messages
            .last()
            .map_or(MessageId::ZERO, |m| m.message_id)
            .next();
        let stored = message.into_message(id, Utc::now());
        shard.messages.push(stored.clone());
        Ok(stored)
    }

    async fn history(
        &self,
        trip_id: &TripId,
        since: MessageId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(Vec::new());
        };
        let shard = shard.lock().await;
        // Ids are dense from 1, so the first message after `since` is at index `since`.
        let start = (since.value() as usize).min(shard.messages.len());
        Ok(shard.messages[start..].iter().take(limit).cloned().collect())
    }

    async fn latest_id(&self, trip_id: &TripId) -> Result<MessageId, StoreError> {
        let Some(shard) = self.shard(trip_id).await else {
            return Ok(MessageId::ZERO);
        };
        let shard = shard.lock().await;
        Ok(shard
            .messages
            .last()
            .map_or(MessageId::ZERO, |m| m.message_id))
    }
}
