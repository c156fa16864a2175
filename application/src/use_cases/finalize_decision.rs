//! Decision finalizer, the polling phase's completion action.
//!
//! Takes the full ranking of every option kind, applies the
//! [`DecisionPolicy`] and overwrites the trip's single snapshot. The snapshot
//! carries no timestamps, so running twice over unchanged tallies stores
//! byte-identical documents.

use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::store::{DecisionStore, MembershipDirectory};
use crate::use_cases::complete_phase::CompletionAction;
use crate::use_cases::poll::PollUseCase;
use crate::use_cases::shared::load_trip;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use vibecation_domain::{
    DecisionPolicy, DecisionSnapshot, DomainError, OptionKind, TripId, TripStatus,
};

pub struct DecisionFinalizer {
    directory: Arc<dyn MembershipDirectory>,
    polls: Arc<PollUseCase>,
    decisions: Arc<dyn DecisionStore>,
    policy: DecisionPolicy,
    audit: Arc<dyn AuditLog>,
}

impl DecisionFinalizer {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        polls: Arc<PollUseCase>,
        decisions: Arc<dyn DecisionStore>,
    ) -> Self {
        Self {
            directory,
            polls,
            decisions,
            policy: DecisionPolicy::default(),
            audit: Arc::new(NoAuditLog),
        }
    }

    pub fn with_policy(mut self, policy: DecisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Derive and persist the snapshot.
    pub async fn finalize(&self, trip_id: &TripId) -> Result<DecisionSnapshot, DomainError> {
        load_trip(self.directory.as_ref(), trip_id).await?;

        let mut rankings = HashMap::new();
        for kind in OptionKind::ALL {
            rankings.insert(kind, self.polls.ranked_options(trip_id, kind).await?);
        }
        let snapshot = DecisionSnapshot::derive(trip_id.clone(), self.policy, |kind| {
            rankings.remove(&kind).unwrap_or_default()
        });

        self.decisions.put(&snapshot).await?;
        self.directory
            .set_status(trip_id, TripStatus::Decided)
            .await?;

        info!(
            "Decision for {}: {} activities, {} locations, {} cuisines ({} votes)",
            trip_id,
            snapshot.top_activities.len(),
            snapshot.top_locations.len(),
            snapshot.top_cuisines.len(),
            snapshot.total_votes
        );
        self.audit.record(AuditEvent::new(
            "decision_finalized",
            json!({ "trip": trip_id, "total_votes": snapshot.total_votes }),
        ));
        Ok(snapshot)
    }

    /// Read the stored snapshot; NotFound until polling is finalized.
    pub async fn snapshot(&self, trip_id: &TripId) -> Result<DecisionSnapshot, DomainError> {
        load_trip(self.directory.as_ref(), trip_id).await?;
        self.decisions
            .get(trip_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("decision for trip {}", trip_id)))
    }
}

#[async_trait]
impl CompletionAction for DecisionFinalizer {
    fn name(&self) -> &'static str {
        "decision-finalizer"
    }

    async fn run(&self, trip_id: &TripId) -> Result<(), DomainError> {
        self.finalize(trip_id).await.map(|_| ())
    }
}
