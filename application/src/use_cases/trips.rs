//! Trip creation and lookup

use crate::ports::audit_log::{AuditEvent, AuditLog, NoAuditLog};
use crate::ports::store::{MembershipDirectory, NewTrip};
use crate::use_cases::shared::load_trip;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use vibecation_domain::{DomainError, Trip, TripId, UserId};

pub struct TripUseCase {
    directory: Arc<dyn MembershipDirectory>,
    audit: Arc<dyn AuditLog>,
}

impl TripUseCase {
    pub fn new(directory: Arc<dyn MembershipDirectory>) -> Self {
        Self {
            directory,
            audit: Arc::new(NoAuditLog),
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLog>) -> Self {
        self.audit = audit;
        self
    }

    /// Create a trip; the creator is always added as a member.
    pub async fn create_trip(&self, owner: &UserId, new_trip: NewTrip) -> Result<Trip, DomainError> {
        if new_trip.title.trim().is_empty() {
            return Err(DomainError::Invalid("trip title is empty".to_string()));
        }
        if owner.as_str().trim().is_empty() {
            return Err(DomainError::Invalid("trip owner is empty".to_string()));
        }

        let trip = self.directory.create_trip(owner, new_trip).await?;
        info!(
            "Created {} '{}' with {} members",
            trip.id,
            trip.title,
            trip.member_count()
        );
        self.audit.record(AuditEvent::new(
            "trip_created",
            json!({ "trip": trip.id, "owner": owner, "members": trip.members }),
        ));
        Ok(trip)
    }

    pub async fn trip_info(&self, trip_id: &TripId) -> Result<Trip, DomainError> {
        load_trip(self.directory.as_ref(), trip_id).await
    }
}
