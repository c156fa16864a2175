//! Complete Phase use case (the completion gate)
//!
//! Tracks, per trip and phase, which members have marked the phase complete
//! and fires the phase's registered [`CompletionAction`] exactly once when
//! the last member arrives.
//!
//! # Algorithm
//!
//! ```text
//! mark_complete(trip, user, phase)
//!   1. load record + version (or start a fresh one)
//!   2. add user, refresh total_members            (idempotent)
//!   3. CAS record; on conflict goto 1
//!   4. all members done && !finalized?
//!        CAS finalized false -> true              (the "claim")
//!        winner runs the action
//!   5. action failed?
//!        winner CASes finalized back to false
//!        -> DownstreamFailure; a later mark retries
//! ```
//!
//! Only the caller whose claim CAS succeeds runs the action, so concurrent
//! last-member calls (or calls from several processes sharing the store)
//! cannot invoke it twice. If the process dies between claim and action the
//! record stays finalized without the action having run; see DESIGN.md.

use crate::config::SessionParams;
use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::phase_notifier::{NoPhaseNotifier, PhaseNotifier};
use crate::ports::store::{CompletionStore, MembershipDirectory, Versioned};
use crate::use_cases::shared::{load_member_trip, load_trip, retry_on_conflict};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vibecation_domain::{
    CompletionRecord, DomainError, Phase, PhaseStatus, Trip, TripId, UserId,
};

/// Downstream action fired once a phase is complete.
///
/// Implementations must be idempotent: a failed run is retried by a later
/// `mark_complete`, possibly on another process.
#[async_trait]
pub trait CompletionAction: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, trip_id: &TripId) -> Result<(), DomainError>;
}

/// Use case for marking phases complete and reading their status
pub struct CompletePhaseUseCase {
    directory: Arc<dyn MembershipDirectory>,
    completions: Arc<dyn CompletionStore>,
    actions: HashMap<Phase, Arc<dyn CompletionAction>>,
    notifier: Arc<dyn PhaseNotifier>,
    audit: Arc<dyn AuditLog>,
    max_cas_retries: usize,
}

impl CompletePhaseUseCase {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        completions: Arc<dyn CompletionStore>,
    ) -> Self {
        Self {
            directory,
            completions,
            actions: HashMap::new(),
            notifier: Arc::new(NoPhaseNotifier),
            audit: Arc::new(NoAuditLog),
            max_cas_retries: SessionParams::default().max_cas_retries,
        }
    }

    /// Register the action fired when `phase` completes.
    pub fn with_action(mut self, phase: Phase, action: Arc<dyn CompletionAction>) -> Self {
        self.actions.insert(phase, action);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn PhaseNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_params(mut self, params: &SessionParams) -> Self {
        self.max_cas_retries = params.max_cas_retries;
        self
    }

    /// Record that `user_id` finished `phase`.
    ///
    /// Returns the status after the call. Marking a finalized phase is a
    /// no-op that just reports the status.
    pub async fn mark_complete(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        phase: Phase,
    ) -> Result<PhaseStatus, DomainError> {
        let trip = load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;
        self.ensure_reachable(&trip, phase).await?;

        let record = self.record_member(&trip, user_id, phase).await?;
        let status = record.value.status(&trip.members);
        self.notifier.on_status_changed(trip_id, &status);

        if record.value.finalized || !status.phase_complete {
            return Ok(status);
        }

        if !self.claim(&trip, phase).await? {
            debug!("{} of {} was claimed by another caller", phase, trip_id);
            return self.phase_status(trip_id, phase).await;
        }

        match self.run_action(trip_id, phase).await {
            Ok(()) => {
                info!("{} phase of {} finalized", phase.display_name(), trip_id);
                self.audit.record(AuditEvent::new(
                    "phase_finalized",
                    json!({ "trip": trip_id, "phase": phase, "by": user_id }),
                ));
                self.notifier.on_phase_finalized(trip_id, phase);
                Ok(PhaseStatus {
                    finalized: true,
                    ..status
                })
            }
            Err(err) => {
                warn!("{} action for {} failed: {}", phase, trip_id, err);
                self.release(trip_id, phase).await?;
                Err(DomainError::DownstreamFailure(format!(
                    "{} completion of trip {} failed: {}",
                    phase, trip_id, err
                )))
            }
        }
    }

    /// Side-effect free status read.
    pub async fn phase_status(
        &self,
        trip_id: &TripId,
        phase: Phase,
    ) -> Result<PhaseStatus, DomainError> {
        let trip = load_trip(self.directory.as_ref(), trip_id).await?;
        let record = self
            .completions
            .load(trip_id, phase)
            .await?
            .map(|v| v.value)
            .unwrap_or_else(|| CompletionRecord::new(trip.id.clone(), phase, trip.member_count()));
        Ok(record.status(&trip.members))
    }

    /// Polling opens only after brainstorm's options exist.
    async fn ensure_reachable(&self, trip: &Trip, phase: Phase) -> Result<(), DomainError> {
        if phase != Phase::Polling {
            return Ok(());
        }
        let brainstorm_done = self
            .completions
            .load(&trip.id, Phase::Brainstorm)
            .await?
            .is_some_and(|v| v.value.finalized);
        if brainstorm_done {
            Ok(())
        } else {
            Err(DomainError::Invalid(format!(
                "trip {} has not finished brainstorming",
                trip.id
            )))
        }
    }

    /// Steps 1-3: add the member under compare-and-swap.
    async fn record_member(
        &self,
        trip: &Trip,
        user_id: &UserId,
        phase: Phase,
    ) -> Result<Versioned<CompletionRecord>, DomainError> {
        let what = format!("{}/{} completion", trip.id, phase);
        retry_on_conflict(&what, self.max_cas_retries, || async move {
            let (mut record, expected) = match self.completions.load(&trip.id, phase).await? {
                Some(stored) => (stored.value, Some(stored.version)),
                None => (
                    CompletionRecord::new(trip.id.clone(), phase, trip.member_count()),
                    None,
                ),
            };

            if let Some(version) = expected
                && record.finalized
            {
                return Ok(Versioned::new(record, version));
            }

            let added = record.record(user_id.clone());
            let resized = record.total_members != trip.member_count();
            record.total_members = trip.member_count();

            match expected {
                Some(version) if !added && !resized => Ok(Versioned::new(record, version)),
                _ => {
                    let version = self.completions.compare_and_swap(&record, expected).await?;
                    Ok(Versioned::new(record, version))
                }
            }
        })
        .await
    }

    /// Step 4: flip `finalized` false -> true. Returns whether we won.
    async fn claim(&self, trip: &Trip, phase: Phase) -> Result<bool, DomainError> {
        let what = format!("{}/{} claim", trip.id, phase);
        retry_on_conflict(&what, self.max_cas_retries, || async move {
            let Some(stored) = self.completions.load(&trip.id, phase).await? else {
                return Ok(false);
            };
            let mut record = stored.value;
            if record.finalized || !record.covers(&trip.members) {
                return Ok(false);
            }
            record.finalized = true;
            self.completions
                .compare_and_swap(&record, Some(stored.version))
                .await?;
            Ok(true)
        })
        .await
    }

    /// Step 5: give the claim back so a later mark re-attempts the action.
    async fn release(&self, trip_id: &TripId, phase: Phase) -> Result<(), DomainError> {
        let what = format!("{}/{} release", trip_id, phase);
        retry_on_conflict(&what, self.max_cas_retries, || async move {
            let Some(stored) = self.completions.load(trip_id, phase).await? else {
                return Ok(());
            };
            let mut record = stored.value;
            if !record.finalized {
                return Ok(());
            }
            record.finalized = false;
            self.completions
                .compare_and_swap(&record, Some(stored.version))
                .await?;
            Ok(())
        })
        .await
    }

    async fn run_action(&self, trip_id: &TripId, phase: Phase) -> Result<(), DomainError> {
        match self.actions.get(&phase) {
            Some(action) => {
                debug!("Running {} for {}", action.name(), trip_id);
                action.run(trip_id).await
            }
            None => Ok(()),
        }
    }
}
