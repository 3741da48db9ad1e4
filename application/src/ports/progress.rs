//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation.

use council_domain::DeliberationPhase;

/// Callback for progress updates during a deliberation
///
/// Implementations live at the composition root and can display progress
/// in various ways (console, web UI, etc.)
pub trait DeliberationProgress: Send + Sync {
    /// Called when a phase starts
    fn on_phase_start(&self, phase: &DeliberationPhase, total_tasks: usize);

    /// Called when a task completes within a phase
    fn on_task_complete(&self, phase: &DeliberationPhase, label: &str, success: bool);

    /// Called when a phase completes
    fn on_phase_complete(&self, phase: &DeliberationPhase);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_phase_start(&self, _phase: &DeliberationPhase, _total_tasks: usize) {}
    fn on_task_complete(&self, _phase: &DeliberationPhase, _label: &str, _success: bool) {}
    fn on_phase_complete(&self, _phase: &DeliberationPhase) {}
}
