//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] - trip, user, option and message identifiers
//! - [`error::DomainError`] - domain-level errors

pub mod error;
pub mod ids;
