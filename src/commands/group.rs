//! Plan and apply commands
//!
//! Both build a request from flags and `--file`, authenticate, and run the
//! reconciler against the `ipa` client. `plan` runs it in check mode.

use anyhow::{Context as AnyhowContext, Result};
use ipakit::IpaCli;
use krbsession::SessionManager;
use reconcile::{ExecuteOptions, ReconciliationResult, reconcile};

use crate::Context;
use crate::cli::GroupArgs;
use crate::config;
use crate::ui;

/// Run a reconciliation; `dry_run` selects check mode
pub fn run(ctx: &Context, args: GroupArgs, dry_run: bool) -> Result<()> {
    let json = args.json;
    let request = config::build_request(args)?;
    log::debug!(
        "Reconciling {:?} (state {}, action {}) as {}",
        request.names,
        request.state,
        request.action,
        request.principal
    );

    let opts = ExecuteOptions { dry_run };
    let manager = SessionManager::new();
    let mut progress = ui::TerminalProgress {
        silent: ctx.quiet || json,
    };

    let result = reconcile(
        &request,
        &opts,
        |principal, password| manager.acquire(principal, password),
        |session| IpaCli::new(session.ccache()),
        &mut progress,
    )?;

    report(ctx, &result, json)
}

fn report(ctx: &Context, result: &ReconciliationResult, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        println!("{out}");
        return Ok(());
    }

    if ctx.quiet {
        return Ok(());
    }
    if ctx.verbose > 0 {
        for operation in &result.operations {
            ui::dim(&ui::describe(operation));
        }
    }
    ui::print_summary(result);
    Ok(())
}
