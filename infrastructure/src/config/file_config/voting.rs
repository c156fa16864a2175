//! Voting configuration from TOML (`[voting]` section)

use serde::{Deserialize, Serialize};

/// Compare-and-swap tuning for the vote ledger and completion gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileVotingConfig {
    /// Extra attempts after a lost compare-and-swap before giving up
    pub max_cas_retries: usize,
}

impl Default for FileVotingConfig {
    fn default() -> Self {
        Self {
            max_cas_retries: 16,
        }
    }
}
