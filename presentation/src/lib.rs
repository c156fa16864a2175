//! Presentation layer for vibecation
//!
//! This crate contains the CLI definition, the axum HTTP/WebSocket boundary
//! and console output formatting.

pub mod cli;
pub mod http;
pub mod output;

// Re-export commonly used types
pub use cli::commands::{Cli, Command};
pub use http::{ApiError, AppState, router};
pub use output::console::ConsoleFormatter;
