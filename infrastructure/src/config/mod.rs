//! Configuration file loading for vibecation
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `VIBECATION_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./vibecation.toml` or `./.vibecation.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/vibecation/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigIssue, ConfigIssueCode, FileChatConfig, FileConfig, FileDecisionConfig,
    FileGeneratorConfig, FileServerConfig, FileVotingConfig, Severity,
};
pub use loader::ConfigLoader;
