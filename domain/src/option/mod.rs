//! Votable options
//!
//! Options are derived once the brainstorm phase completes by unioning every
//! submitted [`SuggestionSet`](crate::suggestion::SuggestionSet). See
//! [`derive_catalogue`] for the exact, deterministic derivation order.

mod derivation;

pub use derivation::derive_catalogue;

use crate::core::error::DomainError;
use crate::core::ids::{OptionId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The category an option (and a vote on it) belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Activity,
    Location,
    Cuisine,
}

impl OptionKind {
    pub const ALL: [OptionKind; 3] = [
        OptionKind::Activity,
        OptionKind::Location,
        OptionKind::Cuisine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Activity => "activity",
            OptionKind::Location => "location",
            OptionKind::Cuisine => "cuisine",
        }
    }
}

impl std::fmt::Display for OptionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OptionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "activity" | "activities" => Ok(OptionKind::Activity),
            "location" | "locations" => Ok(OptionKind::Location),
            "cuisine" | "cuisines" => Ok(OptionKind::Cuisine),
            other => Err(DomainError::NotFound(format!("option kind '{}'", other))),
        }
    }
}

/// A candidate item members vote on (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOption {
    pub id: OptionId,
    pub kind: OptionKind,
    /// Display label, as first proposed
    pub label: String,
    /// Creation order within the trip; ranking tie-breaker
    pub seq: u64,
    /// Members whose submitted sets contained this option
    pub proposed_by: BTreeSet<UserId>,
}

impl VoteOption {
    pub fn new(id: impl Into<OptionId>, kind: OptionKind, label: impl Into<String>, seq: u64) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            seq,
            proposed_by: BTreeSet::new(),
        }
    }
}
