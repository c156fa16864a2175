//! Poll aggregation
//!
//! Tallies are maintained incrementally: every vote-row mutation carries a
//! [`TallyDelta`] that is applied to exactly one [`OptionTally`] in the same
//! atomic store operation. Nothing here ever recounts vote rows.

use crate::core::ids::OptionId;
use crate::option::{OptionKind, VoteOption};
use crate::vote::{Polarity, TallyDelta};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Up/down counters for one option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionTally {
    pub upvotes: u64,
    pub downvotes: u64,
}

impl OptionTally {
    pub fn new(upvotes: u64, downvotes: u64) -> Self {
        Self { upvotes, downvotes }
    }

    /// Always `upvotes - downvotes`
    pub fn net_score(&self) -> i64 {
        self.upvotes as i64 - self.downvotes as i64
    }

    pub fn total(&self) -> u64 {
        self.upvotes + self.downvotes
    }

    /// Apply a signed delta. Counters never go below zero; a delta that would
    /// do so indicates a ledger bug and is clamped.
    pub fn apply(&mut self, delta: TallyDelta) {
        self.upvotes = self.upvotes.saturating_add_signed(delta.upvotes);
        self.downvotes = self.downvotes.saturating_add_signed(delta.downvotes);
    }
}

/// One row of a ranked poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedOption {
    pub option_id: OptionId,
    pub kind: OptionKind,
    pub label: String,
    pub upvotes: u64,
    pub downvotes: u64,
    pub net_score: i64,
    /// Polarity of the requesting member, when the poll is read for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_polarity: Option<Polarity>,
    #[serde(skip)]
    pub seq: u64,
}

/// Order options by net score descending, ties by creation order.
///
/// Options without a tally rank as 0/0.
pub fn rank_options(
    options: &[VoteOption],
    tallies: &HashMap<OptionId, OptionTally>,
) -> Vec<RankedOption> {
    let mut ranked: Vec<RankedOption> = options
        .iter()
        .map(|option| {
            let tally = tallies.get(&option.id).copied().unwrap_or_default();
            RankedOption {
                option_id: option.id.clone(),
                kind: option.kind,
                label: option.label.clone(),
                upvotes: tally.upvotes,
                downvotes: tally.downvotes,
                net_score: tally.net_score(),
                caller_polarity: None,
                seq: option.seq,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.net_score.cmp(&a.net_score).then(a.seq.cmp(&b.seq)));
    ranked
}
