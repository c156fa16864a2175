//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application parameters
//! with [`FileConfig::to_session_params`].

mod chat;
mod decision;
mod generator;
mod issue;
mod server;
mod voting;

pub use chat::FileChatConfig;
pub use decision::FileDecisionConfig;
pub use generator::FileGeneratorConfig;
pub use issue::{ConfigIssue, ConfigIssueCode, Severity};
pub use server::FileServerConfig;
pub use voting::FileVotingConfig;

use serde::{Deserialize, Serialize};
use vibecation_application::SessionParams;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP boundary and log outputs
    pub server: FileServerConfig,
    /// Vote ledger / completion gate retry tuning
    pub voting: FileVotingConfig,
    /// Decision snapshot policy
    pub decision: FileDecisionConfig,
    /// Live channel sizing
    pub chat: FileChatConfig,
    /// Candidate generator source
    pub generator: FileGeneratorConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if let Err(e) = self.server.bind_addr() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::InvalidValue {
                    field: "server.bind".to_string(),
                    value: self.server.bind.clone(),
                },
                message: format!("server.bind '{}' is not a socket address: {}", self.server.bind, e),
            });
        }

        if self.voting.max_cas_retries == 0 {
            issues.push(ConfigIssue::constraint(
                "voting.max_cas_retries",
                "voting.max_cas_retries = 0: every contended write will fail on first conflict",
            ));
        }

        issues.extend(self.decision.to_policy().1);
        issues.extend(self.chat.to_params().1);

        if self.chat.broker_capacity == 0 {
            issues.push(ConfigIssue::constraint(
                "chat.broker_capacity",
                "chat.broker_capacity must be at least 1, using 1",
            ));
        }

        if self.generator.endpoint.is_some() && !cfg!(feature = "remote-generator") {
            issues.push(ConfigIssue {
                severity: Severity::Warning,
                code: ConfigIssueCode::UnavailableFeature {
                    section: "generator".to_string(),
                    feature: "remote-generator".to_string(),
                },
                message: "[generator] endpoint is set but this build lacks the remote-generator \
                          feature; using the sample generator"
                    .to_string(),
            });
        }

        issues
    }

    /// Build the application parameters, applying fallbacks for invalid values.
    pub fn to_session_params(&self) -> SessionParams {
        SessionParams::default()
            .with_max_cas_retries(self.voting.max_cas_retries)
            .with_decision(self.decision.to_policy().0)
            .with_chat(self.chat.to_params().0)
    }
}
