use crate::models::args::PublishArgs;
use crate::services::utils::{Workspace, render_publish_table};
use anyhow::{Context, Result};
use mple_release::process::{SystemRunner, ThreadDelay};
use mple_release::publish::{PublishPlan, Publisher};
use std::time::Duration;
use tracing::warn;

/// Publishes every configured target and reports the outcome of each.
///
/// All targets are attempted even when one fails. The command still fails at the end if
/// any target failed, unless `--no-fail` is given.
///
/// # Errors
/// Returns an error for invalid settings, and for failed targets without `--no-fail`.
pub fn publish(workspace: &Workspace, args: &PublishArgs) -> Result<()> {
    let mut plan = PublishPlan::from_settings(&workspace.root, &workspace.settings)?;
    plan.dry_run |= args.dry_run;
    if let Some(secs) = args.delay {
        plan.delay = Duration::from_secs(secs);
    }

    let report = Publisher::new(SystemRunner, ThreadDelay).publish_all(&plan);

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("Failed to serialize publish report")?;
        println!("{json}");
    } else {
        render_publish_table(&report);
    }

    if args.no_fail {
        let failed = report.failures().count();
        if failed > 0 {
            warn!(failed, "Ignoring failed packages because of --no-fail");
        }
        return Ok(());
    }

    report.into_result()?;
    Ok(())
}
