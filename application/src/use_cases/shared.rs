//! Shared helpers for use cases.
//!
//! Membership checks and the bounded compare-and-swap retry loop used by the
//! vote ledger, completion gate and suggestion authoring.

use crate::ports::store::MembershipDirectory;
use std::future::Future;
use tracing::debug;
use vibecation_domain::{DomainError, Trip, TripId, UserId};

/// Load a trip or fail with `NotFound`.
pub(crate) async fn load_trip(
    directory: &dyn MembershipDirectory,
    trip_id: &TripId,
) -> Result<Trip, DomainError> {
    directory
        .trip(trip_id)
        .await?
        .ok_or_else(|| DomainError::not_found(format!("trip {}", trip_id)))
}

/// Load a trip and check that `user_id` is a member.
pub(crate) async fn load_member_trip(
    directory: &dyn MembershipDirectory,
    trip_id: &TripId,
    user_id: &UserId,
) -> Result<Trip, DomainError> {
    let trip = load_trip(directory, trip_id).await?;
    trip.authorize(user_id)?;
    Ok(trip)
}

/// Run `attempt` until it stops reporting a store conflict.
///
/// Conflicts are absorbed up to `max_retries` extra attempts; exhaustion is
/// reported as a retryable `DownstreamFailure` so callers never see a raw
/// `Conflict`.
pub(crate) async fn retry_on_conflict<T, F, Fut>(
    what: &str,
    max_retries: usize,
    mut attempt: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    for round in 0..=max_retries {
        match attempt().await {
            Err(err) if err.is_conflict() => {
                debug!("CAS conflict on {} (attempt {}), retrying", what, round + 1);
                tokio::task::yield_now().await;
            }
            other => return other,
        }
    }
    Err(DomainError::DownstreamFailure(format!(
        "gave up on {} after {} contended attempts",
        what,
        max_retries + 1
    )))
}
