//! Chat configuration from TOML (`[chat]` section)

use super::issue::ConfigIssue;
use serde::{Deserialize, Serialize};
use vibecation_application::ChatParams;

/// Live channel sizing.
///
/// # Example
///
/// ```toml
/// [chat]
/// connection_buffer = 128
/// max_history_limit = 200
/// reconnect_backoff_secs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    /// Frames queued per connection before it is evicted
    pub connection_buffer: usize,
    pub default_history_limit: usize,
    pub max_history_limit: usize,
    /// Advertised to clients in the welcome frame
    pub reconnect_backoff_secs: u64,
    /// Frames the in-process broker retains for slow hubs
    pub broker_capacity: usize,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        let params = ChatParams::default();
        Self {
            connection_buffer: params.connection_buffer,
            default_history_limit: params.default_history_limit,
            max_history_limit: params.max_history_limit,
            reconnect_backoff_secs: params.reconnect_backoff_secs,
            broker_capacity: 1024,
        }
    }
}

impl FileChatConfig {
    /// Convert to application params, replacing out-of-range values.
    pub fn to_params(&self) -> (ChatParams, Vec<ConfigIssue>) {
        let defaults = ChatParams::default();
        let mut issues = Vec::new();

        let mut pick = |field: &str, value: usize, fallback: usize| {
            if value == 0 {
                issues.push(ConfigIssue::constraint(
                    field,
                    format!("{} must be at least 1, using {}", field, fallback),
                ));
                fallback
            } else {
                value
            }
        };
        let connection_buffer = pick(
            "chat.connection_buffer",
            self.connection_buffer,
            defaults.connection_buffer,
        );
        let max_history_limit = pick(
            "chat.max_history_limit",
            self.max_history_limit,
            defaults.max_history_limit,
        );
        let mut default_history_limit = pick(
            "chat.default_history_limit",
            self.default_history_limit,
            defaults.default_history_limit,
        );

        if default_history_limit > max_history_limit {
            issues.push(ConfigIssue::constraint(
                "chat.default_history_limit",
                format!(
                    "chat.default_history_limit ({}) exceeds chat.max_history_limit ({})",
                    default_history_limit, max_history_limit
                ),
            ));
            default_history_limit = max_history_limit;
        }

        let params = ChatParams {
            connection_buffer,
            default_history_limit,
            max_history_limit,
            reconnect_backoff_secs: self.reconnect_backoff_secs,
        };
        (params, issues)
    }

    pub fn broker_capacity(&self) -> usize {
        self.broker_capacity.max(1)
    }
}
