//! Decision snapshot
//!
//! The snapshot is the finalized top-N selection per category. It is derived
//! purely from ranked polls and a [`DecisionPolicy`]; it carries no
//! timestamps so re-deriving from unchanged inputs yields identical bytes.

use crate::core::ids::TripId;
use crate::option::OptionKind;
use crate::poll::RankedOption;
use serde::{Deserialize, Serialize};

/// Filter and truncation rules for the decision snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPolicy {
    /// Options must reach at least this net score
    pub min_net_score: i64,
    /// Maximum entries kept per category
    pub top_n: usize,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            min_net_score: 1,
            top_n: 10,
        }
    }
}

impl DecisionPolicy {
    pub fn with_min_net_score(mut self, min: i64) -> Self {
        self.min_net_score = min;
        self
    }

    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    /// Keep qualifying entries of an already ranked list, in order.
    pub fn select(&self, ranked: &[RankedOption]) -> Vec<RankedOption> {
        ranked
            .iter()
            .filter(|r| r.net_score >= self.min_net_score)
            .take(self.top_n)
            .cloned()
            .map(|mut r| {
                r.caller_polarity = None;
                r
            })
            .collect()
    }
}

/// Finalized per-trip decision (one document per trip, overwritten)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSnapshot {
    pub trip_id: TripId,
    pub top_activities: Vec<RankedOption>,
    pub top_locations: Vec<RankedOption>,
    pub top_cuisines: Vec<RankedOption>,
    pub total_votes: u64,
    pub policy: DecisionPolicy,
}

impl DecisionSnapshot {
    /// Derive the snapshot from full rankings of each kind.
    ///
    /// `rankings` supplies every option of a kind (not just the winners) so
    /// `total_votes` counts all up and down votes cast in the trip.
    pub fn derive<F>(trip_id: TripId, policy: DecisionPolicy, mut rankings: F) -> Self
    where
        F: FnMut(OptionKind) -> Vec<RankedOption>,
    {
        let mut total_votes = 0;
        let mut pick = |kind: OptionKind| {
            let ranked = rankings(kind);
            total_votes += ranked.iter().map(|r| r.upvotes + r.downvotes).sum::<u64>();
            policy.select(&ranked)
        };

        let top_activities = pick(OptionKind::Activity);
        let top_locations = pick(OptionKind::Location);
        let top_cuisines = pick(OptionKind::Cuisine);

        Self {
            trip_id,
            top_activities,
            top_locations,
            top_cuisines,
            total_votes,
            policy,
        }
    }

    /// Canonical serialized form used for persistence and comparison.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn top(&self, kind: OptionKind) -> &[RankedOption] {
        match kind {
            OptionKind::Activity => &self.top_activities,
            OptionKind::Location => &self.top_locations,
            OptionKind::Cuisine => &self.top_cuisines,
        }
    }
}
