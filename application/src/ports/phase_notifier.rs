//! Phase notification port
//!
//! The completion gate reports progress through this port so clients can be
//! pushed status changes over their live channel instead of re-polling
//! `phaseStatus`. Polling remains available; pushes only supplement it.

use vibecation_domain::{Phase, PhaseStatus, TripId};

/// Callback for completion-gate progress
pub trait PhaseNotifier: Send + Sync {
    /// A member's completion was recorded (or re-confirmed)
    fn on_status_changed(&self, trip_id: &TripId, status: &PhaseStatus);

    /// The phase's completion action ran successfully
    fn on_phase_finalized(&self, trip_id: &TripId, phase: Phase);
}

/// No-op notifier for when push updates are not wired
pub struct NoPhaseNotifier;

impl PhaseNotifier for NoPhaseNotifier {
    fn on_status_changed(&self, _trip_id: &TripId, _status: &PhaseStatus) {}
    fn on_phase_finalized(&self, _trip_id: &TripId, _phase: Phase) {}
}
