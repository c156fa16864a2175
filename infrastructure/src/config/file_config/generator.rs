//! Candidate generator configuration from TOML (`[generator]` section)

use serde::{Deserialize, Serialize};

/// Where itinerary drafts come from.
///
/// Without an endpoint the built-in sample generator is used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGeneratorConfig {
    /// Base URL of a remote generator service
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileGeneratorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: 30,
        }
    }
}
