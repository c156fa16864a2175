//! In-memory port implementations for use case tests.

use crate::ports::store::{
    ChatStore, CompletionStore, DecisionStore, MembershipDirectory, NewTrip, OptionStore,
    StoreError, SuggestionStore, Versioned, VoteStore,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use vibecation_domain::{
    ChatMessage, CompletionRecord, DecisionSnapshot, MessageId, NewChatMessage, OptionId,
    OptionKind, OptionTally, Phase, Polarity, SuggestionSet, Trip, TripId, TripStatus, UserId,
    VoteKey, VoteOption, VoteTransition,
};

#[derive(Default)]
struct State {
    trips: HashMap<TripId, Trip>,
    votes: HashMap<VoteKey, Polarity>,
    tallies: HashMap<(TripId, OptionId), OptionTally>,
    options: HashMap<TripId, Vec<VoteOption>>,
    completions: HashMap<(TripId, Phase), Versioned<CompletionRecord>>,
    suggestions: HashMap<(TripId, UserId), Versioned<SuggestionSet>>,
    decisions: HashMap<TripId, DecisionSnapshot>,
    messages: HashMap<TripId, Vec<ChatMessage>>,
}

/// Single-lock store; every operation is trivially atomic.
#[derive(Default)]
pub(crate) struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Trip owned by the first member.
    pub fn with_trip(trip_id: &str, members: &[&str]) -> Self {
        let store = Self::default();
        store.add_trip(trip_id, members);
        store
    }

    pub fn add_trip(&self, trip_id: &str, members: &[&str]) {
        let owner = UserId::new(members.first().copied().unwrap_or("owner"));
        let trip = Trip::new(
            TripId::new(trip_id),
            trip_id,
            owner,
            members.iter().map(|m| UserId::new(*m)),
        );
        self.state.lock().unwrap().trips.insert(trip.id.clone(), trip);
    }

    pub async fn seed_options(&self, trip_id: &str, options: Vec<VoteOption>) {
        self.replace_options(&TripId::new(trip_id), options).await.unwrap();
    }
}

#[async_trait]
impl MembershipDirectory for MemoryStore {
    async fn trip(&self, trip_id: &TripId) -> Result<Option<Trip>, StoreError> {
        Ok(self.state.lock().unwrap().trips.get(trip_id).cloned())
    }

    async fn create_trip(&self, owner: &UserId, new_trip: NewTrip) -> Result<Trip, StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = new_trip
            .id
            .unwrap_or_else(|| TripId::sequential(state.trips.len() as u64 + 1));
        if state.trips.contains_key(&id) {
            return Err(StoreError::Conflict(id.to_string()));
        }
        let trip = Trip::new(id.clone(), new_trip.title, owner.clone(), new_trip.members)
            .with_description(new_trip.description);
        state.trips.insert(id, trip.clone());
        Ok(trip)
    }

    async fn set_status(&self, trip_id: &TripId, status: TripStatus) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let trip = state
            .trips
            .get_mut(trip_id)
            .ok_or_else(|| StoreError::NotFound(trip_id.to_string()))?;
        trip.status = status;
        Ok(())
    }
}

#[async_trait]
impl VoteStore for MemoryStore {
    async fn current(&self, key: &VoteKey) -> Result<Option<Polarity>, StoreError> {
        Ok(self.state.lock().unwrap().votes.get(key).copied())
    }

    async fn commit(&self, key: &VoteKey, transition: &VoteTransition) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.votes.get(key).copied() != transition.expected {
            return Err(StoreError::Conflict(key.to_string()));
        }
        match transition.next {
            Some(p) => state.votes.insert(key.clone(), p),
            None => state.votes.remove(key),
        };
        state
            .tallies
            .entry((key.trip_id.clone(), key.option_id.clone()))
            .or_default()
            .apply(transition.delta());
        Ok(())
    }

    async fn tallies(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, OptionTally>, StoreError> {
        let state = self.state.lock().unwrap();
        let options = state.options.get(trip_id).cloned().unwrap_or_default();
        Ok(options
            .into_iter()
            .filter(|o| o.kind == kind)
            .filter_map(|o| {
                state
                    .tallies
                    .get(&(trip_id.clone(), o.id.clone()))
                    .map(|t| (o.id, *t))
            })
            .collect())
    }

    async fn polarities(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        kind: OptionKind,
    ) -> Result<HashMap<OptionId, Polarity>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .votes
            .iter()
            .filter(|(k, _)| &k.trip_id == trip_id && &k.user_id == user_id && k.kind == kind)
            .map(|(k, p)| (k.option_id.clone(), *p))
            .collect())
    }
}

#[async_trait]
impl OptionStore for MemoryStore {
    async fn replace_options(
        &self,
        trip_id: &TripId,
        options: Vec<VoteOption>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.options.insert(trip_id.clone(), options);
        Ok(())
    }

    async fn options(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<Vec<VoteOption>, StoreError> {
        let state = self.state.lock().unwrap();
        let mut options: Vec<VoteOption> = state
            .options
            .get(trip_id)
            .map(|all| all.iter().filter(|o| o.kind == kind).cloned().collect())
            .unwrap_or_default();
        options.sort_by_key(|o| o.seq);
        Ok(options)
    }

    async fn option(
        &self,
        trip_id: &TripId,
        option_id: &OptionId,
    ) -> Result<Option<VoteOption>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .options
            .get(trip_id)
            .and_then(|all| all.iter().find(|o| &o.id == option_id).cloned()))
    }
}

#[async_trait]
impl CompletionStore for MemoryStore {
    async fn load(
        &self,
        trip_id: &TripId,
        phase: Phase,
    ) -> Result<Option<Versioned<CompletionRecord>>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state.completions.get(&(trip_id.clone(), phase)).cloned())
    }

    async fn compare_and_swap(
        &self,
        record: &CompletionRecord,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let key = (record.trip_id.clone(), record.phase);
        let stored = state.completions.get(&key).map(|v| v.version);
        if stored != expected {
            return Err(StoreError::Conflict(format!("{}/{}", key.0, key.1)));
        }
        let version = stored.unwrap_or(0) + 1;
        state
            .completions
            .insert(key, Versioned::new(record.clone(), version));
        Ok(version)
    }
}

#[async_trait]
impl SuggestionStore for MemoryStore {
    async fn load(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
    ) -> Result<Option<Versioned<SuggestionSet>>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .suggestions
            .get(&(trip_id.clone(), user_id.clone()))
            .cloned())
    }

    async fn compare_and_swap(
        &self,
        set: &SuggestionSet,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut state = self.state.lock().unwrap();
        let key = (set.trip_id.clone(), set.user_id.clone());
        let stored = state.suggestions.get(&key).map(|v| v.version);
        if stored != expected {
            return Err(StoreError::Conflict(format!("{}/{}", key.0, key.1)));
        }
        let version = stored.unwrap_or(0) + 1;
        state.suggestions.insert(key, Versioned::new(set.clone(), version));
        Ok(version)
    }

    async fn submitted(&self, trip_id: &TripId) -> Result<Vec<SuggestionSet>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .suggestions
            .values()
            .filter(|v| &v.value.trip_id == trip_id && v.value.is_submitted())
            .map(|v| v.value.clone())
            .collect())
    }
}

#[async_trait]
impl DecisionStore for MemoryStore {
    async fn put(&self, snapshot: &DecisionSnapshot) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state
            .decisions
            .insert(snapshot.trip_id.clone(), snapshot.clone());
        Ok(())
    }

    async fn get(&self, trip_id: &TripId) -> Result<Option<DecisionSnapshot>, StoreError> {
        Ok(self.state.lock().unwrap().decisions.get(trip_id).cloned())
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn append(&self, message: NewChatMessage) -> Result<ChatMessage, StoreError> {
        let mut state = self.state.lock().unwrap();
        let log = state.messages.entry(message.trip_id.clone()).or_default();
        let id = log
            .last()
            .map(|m| m.message_id)
            .unwrap_or(MessageId::ZERO)
            .next();
        let stored = message.into_message(id, Utc::now());
        log.push(stored.clone());
        Ok(stored)
    }

    async fn history(
        &self,
        trip_id: &TripId,
        since: MessageId,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .get(trip_id)
            .map(|log| {
                log.iter()
                    .filter(|m| m.message_id > since)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn latest_id(&self, trip_id: &TripId) -> Result<MessageId, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .messages
            .get(trip_id)
            .and_then(|log| log.last())
            .map(|m| m.message_id)
            .unwrap_or(MessageId::ZERO))
    }
}
