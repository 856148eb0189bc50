//! Progress reporting hooks
//!
//! These traits allow the declarative crate to be used without
//! depending on a specific terminal UI.

use crate::error::Error;
use crate::planner::MutationStep;

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during [`apply`](crate::apply).
pub trait ProgressCallback {
    /// Called once before the first step with the number of planned steps
    fn on_plan_start(&mut self, steps: usize);

    /// Called before each step's remote call
    fn on_step_start(&mut self, index: usize, step: &MutationStep);

    /// Called after each step, with the error if it failed
    fn on_step_complete(&mut self, index: usize, step: &MutationStep, error: Option<&Error>);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan_start(&mut self, _steps: usize) {}
    fn on_step_start(&mut self, _index: usize, _step: &MutationStep) {}
    fn on_step_complete(&mut self, _index: usize, _step: &MutationStep, _error: Option<&Error>) {}
}

/// Records step descriptions; handy in tests and for summaries.
#[derive(Debug, Default)]
pub struct StepLog {
    pub started: Vec<String>,
    pub failed: Vec<String>,
}

impl ProgressCallback for StepLog {
    fn on_plan_start(&mut self, _steps: usize) {}

    fn on_step_start(&mut self, _index: usize, step: &MutationStep) {
        self.started.push(step.to_string());
    }

    fn on_step_complete(&mut self, _index: usize, step: &MutationStep, error: Option<&Error>) {
        if error.is_some() {
            self.failed.push(step.to_string());
        }
    }
}
