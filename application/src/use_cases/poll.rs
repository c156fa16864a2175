//! Poll use case
//!
//! Read side of the vote ledger. Rankings are computed from the stored
//! incremental tallies on every call; nothing is cached here.

use crate::ports::store::{MembershipDirectory, OptionStore, VoteStore};
use crate::use_cases::shared::{load_member_trip, load_trip};
use std::sync::Arc;
use vibecation_domain::{
    DomainError, OptionKind, RankedOption, TripId, UserId, VoteOption, rank_options,
};

/// Ranked poll reads for a trip
pub struct PollUseCase {
    directory: Arc<dyn MembershipDirectory>,
    options: Arc<dyn OptionStore>,
    votes: Arc<dyn VoteStore>,
}

impl PollUseCase {
    pub fn new(
        directory: Arc<dyn MembershipDirectory>,
        options: Arc<dyn OptionStore>,
        votes: Arc<dyn VoteStore>,
    ) -> Self {
        Self {
            directory,
            options,
            votes,
        }
    }

    /// Options of a kind by net score descending, ties by creation order.
    pub async fn ranked_options(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<Vec<RankedOption>, DomainError> {
        let options = self.options.options(trip_id, kind).await?;
        let tallies = self.votes.tallies(trip_id, kind).await?;
        Ok(rank_options(&options, &tallies))
    }

    /// Ranked poll decorated with the caller's own polarity.
    pub async fn poll(
        &self,
        trip_id: &TripId,
        user_id: &UserId,
        kind: OptionKind,
    ) -> Result<Vec<RankedOption>, DomainError> {
        load_member_trip(self.directory.as_ref(), trip_id, user_id).await?;

        let mut ranked = self.ranked_options(trip_id, kind).await?;
        let mine = self.votes.polarities(trip_id, user_id, kind).await?;
        for entry in &mut ranked {
            entry.caller_polarity = mine.get(&entry.option_id).copied();
        }
        Ok(ranked)
    }

    /// The trip's catalogue of a kind in creation order.
    pub async fn list_options(
        &self,
        trip_id: &TripId,
        kind: OptionKind,
    ) -> Result<Vec<VoteOption>, DomainError> {
        load_trip(self.directory.as_ref(), trip_id).await?;
        Ok(self.options.options(trip_id, kind).await?)
    }
}
