//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod audit_log;
pub mod candidate_generator;
pub mod message_broker;
pub mod phase_notifier;
pub mod store;
pub mod subscriber_registry;
