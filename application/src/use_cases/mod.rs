//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod cast_vote;
pub mod chat;
pub mod complete_phase;
pub mod derive_options;
pub mod finalize_decision;
pub mod poll;
pub(crate) mod shared;
pub mod suggestions;
pub mod trips;

#[cfg(test)]
pub(crate) mod test_support;
