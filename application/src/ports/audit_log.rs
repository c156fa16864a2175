//! Port for structured audit logging.
//!
//! Defines the [`AuditLog`] trait for recording coordination events (votes
//! cast, phases completed, decisions finalized, messages sent) to a
//! machine-readable log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures an append-only record
//! of state changes (one JSON object per event).

use serde_json::Value;

/// A structured audit event.
///
/// Each event has a type string and a JSON payload with event-specific
/// fields; adapters add the timestamp when writing.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// Event type identifier (e.g., "vote_cast", "phase_finalized").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for recording audit events.
///
/// `record` is synchronous and non-fallible so it never disrupts the
/// operation being audited; adapter failures are swallowed.
pub trait AuditLog: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLog;

impl AuditLog for NoAuditLog {
    fn record(&self, _event: AuditEvent) {}
}
