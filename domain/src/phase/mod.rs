//! Session phases and completion records
//!
//! A phase (brainstorm, polling) is complete once every trip member has
//! marked it complete. The [`CompletionRecord`] is the unit the completion
//! gate compare-and-swaps; its `finalized` flag flips false -> true exactly
//! once, by the caller that wins the race to run the phase's action.
//!
//! ```text
//!   open ──(last member marks)──▶ complete ──(action CAS winner)──▶ finalized
//!                                    ▲                                 │
//!                                    └──────(action failed, reverted)──┘
//! ```

use crate::core::error::DomainError;
use crate::core::ids::{TripId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named stage of the session gated by full-member completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Members author and submit suggestion sets
    Brainstorm,
    /// Members vote on the derived options
    Polling,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Brainstorm, Phase::Polling];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Brainstorm => "brainstorm",
            Phase::Polling => "polling",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Phase::Brainstorm => "Brainstorm",
            Phase::Polling => "Polling",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brainstorm" => Ok(Phase::Brainstorm),
            "polling" | "poll" => Ok(Phase::Polling),
            other => Err(DomainError::NotFound(format!("phase '{}'", other))),
        }
    }
}

/// Per (trip, phase) completion state (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub trip_id: TripId,
    pub phase: Phase,
    /// Grows monotonically within a phase; never shrinks
    pub completed: BTreeSet<UserId>,
    pub total_members: usize,
    pub finalized: bool,
}

impl CompletionRecord {
    pub fn new(trip_id: TripId, phase: Phase, total_members: usize) -> Self {
        Self {
            trip_id,
            phase,
            completed: BTreeSet::new(),
            total_members,
            finalized: false,
        }
    }

    /// Add a member; returns false when already present.
    pub fn record(&mut self, user: UserId) -> bool {
        self.completed.insert(user)
    }

    /// Whether every current member has completed.
    pub fn covers(&self, members: &BTreeSet<UserId>) -> bool {
        !members.is_empty() && members.iter().all(|m| self.completed.contains(m))
    }

    pub fn status(&self, members: &BTreeSet<UserId>) -> PhaseStatus {
        PhaseStatus {
            phase: self.phase,
            completed_count: self.completed.iter().filter(|u| members.contains(*u)).count(),
            total_members: members.len(),
            phase_complete: self.covers(members),
            finalized: self.finalized,
        }
    }
}

/// Client-facing view of a completion record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseStatus {
    pub phase: Phase,
    pub completed_count: usize,
    pub total_members: usize,
    /// Every member has marked the phase complete
    pub phase_complete: bool,
    /// The phase's completion action has run successfully
    pub finalized: bool,
}
