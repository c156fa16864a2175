//! Store adapters
//!
//! [`InMemoryStore`] implements every persistence port of the application
//! layer with per-trip atomic compare-and-swap.

mod memory;
#[cfg(test)]
mod scenarios;

pub use memory::InMemoryStore;
