//! Cast Vote use case
//!
//! The vote ledger entry point. A cast reads the row's current polarity,
//! resolves toggle semantics, and commits the row change together with its
//! tally delta as one compare-and-swap. Losing a race re-reads and retries;
//! callers never observe the conflict.

use crate::config::SessionParams;
use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::store::{CompletionStore, MembershipDirectory, OptionStore, VoteStore};
use crate::use_cases::shared::{load_member_trip, retry_on_conflict};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use vibecation_domain::{
    CastOutcome, DomainError, OptionId, OptionKind, Phase, Polarity, TripId, UserId, VoteKey,
    VoteTransition,
};

/// Input for the CastVote use case
#[derive(Debug, Clone)]
pub struct CastVoteInput {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub option_id: OptionId,
    pub kind: OptionKind,
    pub polarity: Polarity,
}

impl CastVoteInput {
    pub fn new(
        trip_id: impl Into<TripId>,
        user_id: impl Into<UserId>,
        option_id: impl Into<OptionId>,
        kind: OptionKind,
        polarity: Polarity,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            user_id: user_id.into(),
            option_id: option_id.into(),
            kind,
            polarity,
        }
    }

    fn key(&self) -> VoteKey {
        VoteKey::new(
            self.trip_id.clone(),
            self.user_id.clone(),
            self.option_id.clone(),
            self.kind,
        )
    }
}

/// Use case for casting (or toggling) a vote
pub struct CastVoteUseCase {
    directory: Arc<dyn MembershipDirectory>,
    options: Arc<dyn OptionStore>,
    votes: Arc<dyn VoteStore>,
    completions: Arc<dyn CompletionStore>,
    audit: Arc<dyn AuditLog>,
    max_cas_retries: usize,
}

impl CastVoteUseCase {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        options: Arc<dyn OptionStore>,
        votes: Arc<dyn VoteStore>,
        completions: Arc<dyn CompletionStore>,
    ) -> Self {
        Self {
            directory,
            options,
            votes,
            completions,
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

    /// Cast a vote with toggle semantics.
    pub async fn execute(&self, input: CastVoteInput) -> Result<CastOutcome, DomainError> {
        load_member_trip(self.directory.as_ref(), &input.trip_id, &input.user_id).await?;

        let option = self
            .options
            .option(&input.trip_id, &input.option_id)
            .await?
            .filter(|o| o.kind == input.kind)
            .ok_or_else(|| {
                DomainError::not_found(format!("{} option {}", input.kind, input.option_id))
            })?;

        if let Some(record) = self.completions.load(&input.trip_id, Phase::Polling).await?
            && record.value.finalized
        {
            return Err(DomainError::PhaseClosed {
                trip: input.trip_id.to_string(),
                phase: Phase::Polling.to_string(),
            });
        }

        let key = input.key();
        let what = key.to_string();
        let requested = input.polarity;
        let transition = retry_on_conflict(&what, self.max_cas_retries, || {
            let key = &key;
            async move {
                let current = self.votes.current(key).await?;
                let transition = VoteTransition::resolve(current, requested);
                self.votes.commit(key, &transition).await?;
                Ok(transition)
            }
        })
        .await?;

        debug!("Vote {} -> {:?} ({:?})", key, transition.next, transition.action);
        info!(
            "{} {:?} {} '{}' in {}",
            input.user_id, transition.action, input.kind, option.label, input.trip_id
        );
        self.audit.record(AuditEvent::new(
            "vote_cast",
            json!({
                "trip": input.trip_id,
                "user": input.user_id,
                "option": input.option_id,
                "kind": input.kind,
                "action": transition.action,
                "polarity": transition.next,
            }),
        ));

        Ok(transition.into())
    }
}
