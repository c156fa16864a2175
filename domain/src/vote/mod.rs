//! Vote ledger primitives
//!
//! A vote row is keyed by [`VoteKey`] and holds a single [`Polarity`].
//! Casting a vote is a pure function of the row's current polarity and the
//! requested one, which makes it safe to re-evaluate after a lost
//! compare-and-swap:
//!
//! ```text
//!  current   requested   next     action
//!  ───────   ─────────   ──────   ───────
//!  none      up|down     same     Created
//!  up        up          none     Removed   (toggle-off)
//!  up        down        down     Updated
//! ```

use crate::core::ids::{OptionId, TripId, UserId};
use crate::option::OptionKind;
use serde::{Deserialize, Serialize};

/// Direction of a vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Up,
    Down,
}

impl Polarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Up => "up",
            Polarity::Down => "down",
        }
    }
}

impl std::str::FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" | "upvote" | "+1" => Ok(Polarity::Up),
            "down" | "downvote" | "-1" => Ok(Polarity::Down),
            _ => Err(format!("Unknown polarity: {}. Valid: up, down", s)),
        }
    }
}

/// Identity of a vote row; at most one row exists per key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteKey {
    pub trip_id: TripId,
    pub user_id: UserId,
    pub option_id: OptionId,
    pub kind: OptionKind,
}

impl VoteKey {
    pub fn new(trip_id: TripId, user_id: UserId, option_id: OptionId, kind: OptionKind) -> Self {
        Self {
            trip_id,
            user_id,
            option_id,
            kind,
        }
    }
}

impl std::fmt::Display for VoteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.trip_id, self.user_id, self.kind, self.option_id
        )
    }
}

/// What a cast did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteAction {
    Created,
    Updated,
    Removed,
}

/// Planned change to one vote row, computed from an observed prior state.
///
/// The `expected` polarity is what the store must still hold for the
/// change to apply; it is the compare half of compare-and-swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub expected: Option<Polarity>,
    pub next: Option<Polarity>,
    pub action: VoteAction,
}

impl VoteTransition {
    /// Resolve toggle semantics for a requested polarity.
    pub fn resolve(current: Option<Polarity>, requested: Polarity) -> Self {
        let (next, action) = match current {
            None => (Some(requested), VoteAction::Created),
            Some(existing) if existing == requested => (None, VoteAction::Removed),
            Some(_) => (Some(requested), VoteAction::Updated),
        };
        Self {
            expected: current,
            next,
            action,
        }
    }

    /// Tally change implied by this transition.
    pub fn delta(&self) -> TallyDelta {
        TallyDelta::between(self.expected, self.next)
    }
}

/// Signed change to an option's up/down counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TallyDelta {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl TallyDelta {
    /// -1 for the old polarity, +1 for the new one.
    pub fn between(old: Option<Polarity>, new: Option<Polarity>) -> Self {
        let mut delta = TallyDelta::default();
        match old {
            Some(Polarity::Up) => delta.upvotes -= 1,
            Some(Polarity::Down) => delta.downvotes -= 1,
            None => {}
        }
        match new {
            Some(Polarity::Up) => delta.upvotes += 1,
            Some(Polarity::Down) => delta.downvotes += 1,
            None => {}
        }
        delta
    }

    pub fn is_zero(&self) -> bool {
        self.upvotes == 0 && self.downvotes == 0
    }
}

/// Result of a successful cast, returned to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastOutcome {
    pub action: VoteAction,
    /// `None` after a toggle-off
    pub polarity: Option<Polarity>,
}

impl From<VoteTransition> for CastOutcome {
    fn from(transition: VoteTransition) -> Self {
        Self {
            action: transition.action,
            polarity: transition.next,
        }
    }
}
