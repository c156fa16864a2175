//! Decision configuration from TOML (`[decision]` section)

use super::issue::ConfigIssue;
use serde::{Deserialize, Serialize};
use vibecation_domain::DecisionPolicy;

/// Threshold and size of the decision snapshot.
///
/// # Example
///
/// ```toml
/// [decision]
/// min_net_score = 2
/// top_n = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDecisionConfig {
    pub min_net_score: i64,
    pub top_n: usize,
}

impl Default for FileDecisionConfig {
    fn default() -> Self {
        let policy = DecisionPolicy::default();
        Self {
            min_net_score: policy.min_net_score,
            top_n: policy.top_n,
        }
    }
}

impl FileDecisionConfig {
    /// Convert to the domain policy; `top_n = 0` falls back to the default.
    pub fn to_policy(&self) -> (DecisionPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut policy = DecisionPolicy::default().with_min_net_score(self.min_net_score);
        if self.top_n == 0 {
            issues.push(ConfigIssue::constraint(
                "decision.top_n",
                format!(
                    "decision.top_n must be at least 1, using {}",
                    policy.top_n
                ),
            ));
        } else {
            policy = policy.with_top_n(self.top_n);
        }
        (policy, issues)
    }
}
