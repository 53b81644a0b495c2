//! Entry points tying validation, credentials, planning and execution together

use crate::context::ProgressCallback;
use crate::error::Result;
use crate::executor::execute;
use crate::planner::plan;
use crate::request::ReconciliationRequest;
use crate::types::{ExecuteOptions, ReconciliationResult};
use ipakit::Backend;
use krbsession::CredentialSession;

/// Run a full reconciliation
///
/// The request is validated before anything else happens. A credential
/// session is then acquired through `acquire`, a backend is connected with
/// it through `connect`, and every target is planned and executed. The
/// session is released on every path once it has been acquired; teardown
/// problems are logged by the session and never replace the run's outcome.
///
/// # Arguments
/// * `request` - Desired state for one or more groups
/// * `opts` - Execution options (dry_run)
/// * `acquire` - Obtains credentials for `(principal, password)`
/// * `connect` - Builds a backend bound to the session
/// * `progress` - Progress callback
pub fn reconcile<B, A, C, P>(
    request: &ReconciliationRequest,
    opts: &ExecuteOptions,
    acquire: A,
    connect: C,
    progress: &mut P,
) -> Result<ReconciliationResult>
where
    B: Backend,
    A: FnOnce(&str, Option<&str>) -> krbsession::Result<CredentialSession>,
    C: FnOnce(&CredentialSession) -> ipakit::Result<B>,
    P: ProgressCallback + ?Sized,
{
    request.validate()?;

    let session = acquire(&request.principal, request.password.as_deref())?;
    log::debug!("Using credential session {session:?}");

    let outcome = run_with_session(&session, request, opts, connect, progress);
    session.release();
    outcome
}

fn run_with_session<B, C, P>(
    session: &CredentialSession,
    request: &ReconciliationRequest,
    opts: &ExecuteOptions,
    connect: C,
    progress: &mut P,
) -> Result<ReconciliationResult>
where
    B: Backend,
    C: FnOnce(&CredentialSession) -> ipakit::Result<B>,
    P: ProgressCallback + ?Sized,
{
    let backend = connect(session)?;
    apply(&backend, request, opts, progress)
}

/// Reconcile against a backend that is already connected
///
/// No credentials are handled here; the caller owns the backend's session.
pub fn apply<B, P>(
    backend: &B,
    request: &ReconciliationRequest,
    opts: &ExecuteOptions,
    progress: &mut P,
) -> Result<ReconciliationResult>
where
    B: Backend + ?Sized,
    P: ProgressCallback + ?Sized,
{
    request.validate()?;

    let plan = plan(backend, request)?;
    progress.on_plan(&plan);
    execute(backend, &plan, opts, progress)
}
