//! Trip and membership
//!
//! A trip is the authorization scope of every coordination operation: the
//! vote ledger, completion gate and messaging channel all check that the
//! caller appears in [`Trip::members`] before touching shared state.

use crate::core::error::DomainError;
use crate::core::ids::{TripId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle status of a trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    /// Members are brainstorming and voting
    #[default]
    Planning,
    /// The decision snapshot has been written
    Decided,
}

/// A group trip (Entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub owner: UserId,
    /// Ordered set so member iteration (and derived output) is deterministic.
    pub members: BTreeSet<UserId>,
    #[serde(default)]
    pub status: TripStatus,
}

impl Trip {
    /// Create a trip; the owner is always a member.
    pub fn new(
        id: TripId,
        title: impl Into<String>,
        owner: UserId,
        members: impl IntoIterator<Item = UserId>,
    ) -> Self {
        let mut members: BTreeSet<UserId> = members.into_iter().collect();
        members.insert(owner.clone());
        Self {
            id,
            title: title.into(),
            description: String::new(),
            owner,
            members,
            status: TripStatus::Planning,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_member(&self, user: &UserId) -> bool {
        self.members.contains(user)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Fail with `Unauthorized` unless `user` is a member.
    pub fn authorize(&self, user: &UserId) -> Result<(), DomainError> {
        if self.is_member(user) {
            Ok(())
        } else {
            Err(DomainError::unauthorized(&self.id, user))
        }
    }
}
