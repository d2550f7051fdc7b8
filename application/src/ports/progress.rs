//! Progress notification port
//!
//! Defines the interface for reporting progress during a consultation.

use council_domain::{CouncilPhase, ExpertKind, SessionStatus};

/// Callback for progress updates during a consultation
///
/// Implementations live in the presentation layer. Expert callbacks are
/// invoked from concurrently running sessions.
pub trait ProgressNotifier: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &CouncilPhase, total_tasks: usize);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &CouncilPhase);

    /// Called when an expert session acquires a slot and starts running
    fn on_expert_start(&self, _expert: ExpertKind, _session_id: &str) {}

    /// Called when an expert session reaches a terminal status
    fn on_expert_finish(&self, _expert: ExpertKind, _status: SessionStatus) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_phase_start(&self, _phase: &CouncilPhase, _total_tasks: usize) {}
    fn on_phase_complete(&self, _phase: &CouncilPhase) {}
}
