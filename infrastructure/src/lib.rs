//! Infrastructure layer for vibecation
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer (store, broker, candidate generator, audit log) and
//! configuration file loading.

pub mod broker;
pub mod config;
pub mod generator;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use broker::InProcessBroker;
pub use config::{
    ConfigIssue, ConfigIssueCode, ConfigLoader, FileChatConfig, FileConfig, FileDecisionConfig,
    FileGeneratorConfig, FileServerConfig, FileVotingConfig, Severity,
};
#[cfg(feature = "remote-generator")]
pub use generator::HttpCandidateGenerator;
pub use generator::SampleItineraryGenerator;
pub use logging::JsonlAuditLog;
pub use store::InMemoryStore;
