use crate::services::utils::{Workspace, render_task_table};
use anyhow::Result;
use mple_release::process::{CommandRunner, SystemRunner, ThreadDelay};
use mple_release::tasks::{RunSummary, TEST, TaskOptions, TaskRunner};
use tracing::info;

const NEXTEST_BINARY: &str = "cargo-nextest";

/// Runs a single task (and its dependencies) with the default options.
///
/// # Errors
/// Returns an error if the task is unknown or one of its commands fails.
pub fn run_task(workspace: &Workspace, name: &str) -> Result<RunSummary> {
    execute(workspace, name, &TaskOptions::default())
}

/// Runs tests in the workspace or a specific package.
///
/// `cargo nextest` is used when it is installed.
///
/// # Errors
/// Returns an error if the test command fails or cannot be started.
pub fn run_tests(workspace: &Workspace, project: Option<&str>) -> Result<()> {
    let test_package = project.filter(|p| *p != "all").map(str::to_owned);
    let nextest = SystemRunner.is_available(NEXTEST_BINARY);

    let label = if test_package.is_some() { "crate" } else { "workspace" };
    info!("🧪 Running {label} tests via '{}'...", if nextest { "nextest" } else { "cargo test" });

    execute(workspace, TEST, &TaskOptions { test_package, nextest })?;
    Ok(())
}

/// Lists all registered tasks.
///
/// # Errors
/// Returns an error if the task registry cannot be built from the settings.
pub fn list_tasks(workspace: &Workspace) -> Result<()> {
    let tasks = workspace.tasks(&TaskOptions::default())?;
    if tasks.list().next().is_none() {
        println!("ℹ️ No tasks registered.");
        return Ok(());
    }
    render_task_table(&tasks);
    Ok(())
}

fn execute(workspace: &Workspace, name: &str, options: &TaskOptions) -> Result<RunSummary> {
    let tasks = workspace.tasks(options)?;
    let mut runner = TaskRunner::new(&tasks, SystemRunner, ThreadDelay);
    let summary = runner.run(name)?;
    info!(tasks = %summary.executed.join(", "), "✅ Done");
    Ok(summary)
}
