//! Progress reporting hooks
//!
//! These let the reconcile crate report what it is doing without
//! depending on a particular terminal UI.

use crate::planner::ExecutionPlan;
use crate::types::Operation;

/// Progress callback for reconciliation runs
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once the plan is known, before anything is executed
    fn on_plan(&mut self, plan: &ExecutionPlan);

    /// Called when starting to apply the planned operations
    fn on_batch_start(&mut self, count: usize);

    /// Called when starting a single operation
    fn on_operation_start(&mut self, operation: &Operation);

    /// Called when an operation succeeded
    ///
    /// `summary` is the backend's one-line report, if it gave one.
    fn on_operation_complete(&mut self, operation: &Operation, summary: Option<&str>);

    /// Called when an operation failed; no further operations run
    fn on_operation_failed(&mut self, operation: &Operation, error: &str);

    /// Called when all operations have been applied
    fn on_batch_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan(&mut self, _plan: &ExecutionPlan) {}
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_operation_start(&mut self, _operation: &Operation) {}
    fn on_operation_complete(&mut self, _operation: &Operation, _summary: Option<&str>) {}
    fn on_operation_failed(&mut self, _operation: &Operation, _error: &str) {}
    fn on_batch_complete(&mut self) {}
}
