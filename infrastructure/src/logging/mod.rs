//! Audit logging adapters.
//!
//! Provides [`JsonlAuditLog`], an append-only JSONL file writer that
//! implements the [`AuditLog`](vibecation_application::AuditLog) port.

mod jsonl_audit;

pub use jsonl_audit::JsonlAuditLog;
