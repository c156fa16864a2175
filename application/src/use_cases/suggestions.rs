//! Suggestion authoring use case
//!
//! Members draft their proposed itinerary (by hand or through the candidate
//! generator) and submit it once. Writes are versioned compare-and-swaps so
//! two tabs of the same member cannot silently overwrite each other's submit.

use crate::config::SessionParams;
use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::candidate_generator::CandidateGenerator;
use crate::ports::store::{CompletionStore, MembershipDirectory, SuggestionStore};
use crate::use_cases::shared::{load_member_trip, retry_on_conflict};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use vibecation_domain::{CandidateSet, DomainError, Phase, SuggestionSet, TripId, UserId};

pub struct SuggestionUseCase {
    directory: Arc<dyn MembershipDirectory>,
    suggestions: Arc<dyn SuggestionStore>,
    completions: Arc<dyn CompletionStore>,
    generator: Arc<dyn CandidateGenerator>,
    audit: Arc<dyn AuditLog>,
    max_cas_retries: usize,
}

impl SuggestionUseCase {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        suggestions: Arc<dyn SuggestionStore>,
        completions: Arc<dyn CompletionStore>,
        generator: Arc<dyn CandidateGenerator>,
    ) -> Self {
        Self {
            directory,
            suggestions,
            completions,
            generator,
            audit: Arc::new(NoAuditLog),
            max_cas_retries: SessionParams::default().max_cas_retries,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_params(mut self, params: &SessionParams) -> Self {
        self.max_cas_retries = params.max_cas_retries;
        self
    }

    /// Create or overwrite the member's draft.
    pub async fn save_draft(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        candidates: CandidateSet,
    ) -> Result<SuggestionSet, DomainError> {
        self.ensure_open(trip_id, user_id).await?;
        self.store_draft(trip_id, user_id, candidates).await
    }

    /// Flip the draft to submitted, exactly once.
    pub async fn submit(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
    ) -> Result<SuggestionSet, DomainError> {
        self.ensure_open(trip_id, user_id).await?;

        let what = format!("{}/{} suggestion", trip_id, user_id);
        let set = retry_on_conflict(&what, self.max_cas_retries, || async move {
            let stored = self.suggestions.load(trip_id, user_id).await?.ok_or_else(|| {
                DomainError::not_found(format!("draft of {} in trip {}", user_id, trip_id))
            })?;
            let mut set = stored.value;
            set.submit()?;
            self.suggestions
                .compare_and_swap(&set, Some(stored.version))
                .await?;
            Ok(set)
        })
        .await?;

        info!("{} submitted suggestions for {}", user_id, trip_id);
        self.audit.record(AuditEvent::new(
            "suggestion_submitted",
            json!({ "trip": trip_id, "user": user_id }),
        ));
        Ok(set)
    }

    /// Ask the generator to revise the member's draft and store the result.
    pub async fn generate_draft(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        query: &str,
    ) -> Result<SuggestionSet, DomainError> {
        self.ensure_open(trip_id, user_id).await?;
        let query = query.trim();
        if query.is_empty() {
            return Err(DomainError::Invalid("generation query is empty".to_string()));
        }

        let prior = match self.suggestions.load(trip_id, user_id).await? {
            Some(stored) if stored.value.is_submitted() => {
                return Err(DomainError::AlreadySubmitted {
                    trip: trip_id.to_string(),
                    user: user_id.to_string(),
                });
            }
            Some(stored) => stored.value.candidates,
            None => CandidateSet::default(),
        };

        debug!("Generating candidates for {} in {}", user_id, trip_id);
        let generated = self.generator.generate(query, &prior).await?;

        self.store_draft(trip_id, user_id, generated).await
    }

    pub async fn get(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
    ) -> Result<SuggestionSet, DomainError> {
        load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;
        self.suggestions
            .load(trip_id, user_id)
            .await?
            .map(|stored| stored.value)
            .ok_or_else(|| {
                DomainError::not_found(format!("suggestions of {} in trip {}", user_id, trip_id))
            })
    }

    async fn store_draft(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        candidates: CandidateSet,
    ) -> Result<SuggestionSet, DomainError> {
        let what = format!("{}/{} suggestion", trip_id, user_id);
        let candidates = &candidates;
        retry_on_conflict(&what, self.max_cas_retries, || async move {
            let (set, expected) = match self.suggestions.load(trip_id, user_id).await? {
                Some(stored) => {
                    let mut set = stored.value;
                    set.revise(candidates.clone())?;
                    (set, Some(stored.version))
                }
                None => (
                    SuggestionSet::draft(trip_id.clone(), user_id.clone(), candidates.clone()),
                    None,
                ),
            };
            self.suggestions.compare_and_swap(&set, expected).await?;
            Ok(set)
        })
        .await
    }

    /// Membership plus a brainstorm phase that has not been finalized.
    async fn ensure_open(&self, trip_id: &TripId, user_id: &UserId) -> Result<(), DomainError> {
        load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;
        let closed = self
            .completions
            .load(trip_id, Phase::Brainstorm)
            .await?
            .is_some_and(|record| record.value.finalized);
        if closed {
            return Err(DomainError::PhaseClosed {
                trip: trip_id.to_string(),
                phase: Phase::Brainstorm.to_string(),
            });
        }
        Ok(())
    }
}
