//! Execution engine - applies planned operations in order

use crate::context::ProgressCallback;
use crate::error::{Error, Result};
use crate::planner::ExecutionPlan;
use crate::types::{ExecuteOptions, ReconciliationResult};
use ipakit::{Backend, ErrorCategory};

/// Execute a plan against the backend
///
/// Operations run sequentially in plan order. The first failing operation
/// stops the run; everything applied before it stays applied. A command
/// the backend rejects as a no-op is skipped rather than treated as a
/// failure.
///
/// In a dry run the backend is never called and the result lists the
/// planned operations.
pub fn execute<B, P>(
    backend: &B,
    plan: &ExecutionPlan,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ReconciliationResult>
where
    B: Backend + ?Sized,
    P: ProgressCallback + ?Sized,
{
    if opts.dry_run {
        let mut result = ReconciliationResult {
            dry_run: true,
            ..Default::default()
        };
        for operation in &plan.operations {
            result.record(operation.clone());
        }
        return Ok(result);
    }

    let mut result = ReconciliationResult::default();
    if plan.is_empty() {
        return Ok(result);
    }

    progress.on_batch_start(plan.len());
    for operation in &plan.operations {
        progress.on_operation_start(operation);

        match backend.invoke(operation.kind.command_name(), &operation.target, &operation.args) {
            Ok(response) => {
                log::info!("{}: {}", operation.kind, operation.target);
                progress.on_operation_complete(operation, response.summary.as_deref());
                result.record(operation.clone());
            }
            Err(e) if e.category() == ErrorCategory::NoChange => {
                log::debug!("{}: {}: nothing to change", operation.kind, operation.target);
                progress.on_operation_complete(operation, None);
            }
            Err(e) => {
                let detail = e.to_string();
                progress.on_operation_failed(operation, &detail);
                return Err(Error::CommandExecution {
                    target: operation.target.clone(),
                    kind: operation.kind,
                    detail,
                });
            }
        }
    }
    progress.on_batch_complete();

    Ok(result)
}
