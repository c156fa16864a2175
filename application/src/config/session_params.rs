//! Session parameters for use case tuning.
//!
//! [`SessionParams`] groups the static parameters that control the
//! coordination use cases: compare-and-swap retry limits, the decision
//! policy, and live channel sizing. These are application-layer concerns,
//! loaded from the `[voting]`, `[decision]` and `[chat]` config sections.

use serde::{Deserialize, Serialize};
use vibecation_domain::DecisionPolicy;

/// Live chat channel parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatParams {
    /// Frames buffered per connection before it is evicted.
    pub connection_buffer: usize,
    /// `history` page size when the caller gives no limit.
    pub default_history_limit: usize,
    /// Upper bound for any `history` page.
    pub max_history_limit: usize,
    /// Fixed client reconnect backoff, advertised in the welcome frame.
    pub reconnect_backoff_secs: u64,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            connection_buffer: 256,
            default_history_limit: 50,
            max_history_limit: 500,
            reconnect_backoff_secs: 3,
        }
    }
}

impl ChatParams {
    /// Resolve a caller-supplied history limit.
    pub fn clamp_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_history_limit)
            .clamp(1, self.max_history_limit.max(1))
    }
}

/// Coordination use case parameters.
///
/// | Use case        | Reads                 |
/// |-----------------|-----------------------|
/// | CastVote        | `max_cas_retries`     |
/// | CompletePhase   | `max_cas_retries`     |
/// | FinalizeDecision| `decision`            |
/// | Chat            | `chat`                |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionParams {
    /// Compare-and-swap attempts before a contended write gives up.
    pub max_cas_retries: usize,
    /// Threshold and top-N for decision snapshots.
    pub decision: DecisionPolicy,
    pub chat: ChatParams,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            max_cas_retries: 16,
            decision: DecisionPolicy::default(),
            chat: ChatParams::default(),
        }
    }
}

impl SessionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_cas_retries(mut self, retries: usize) -> Self {
        self.max_cas_retries = retries;
        self
    }

    pub fn with_decision(mut self, policy: DecisionPolicy) -> Self {
        self.decision = policy;
        self
    }

    pub fn with_chat(mut self, chat: ChatParams) -> Self {
        self.chat = chat;
        self
    }
}
