use crate::models::args::EventKind;
use crate::services::utils::Workspace;
use anyhow::{Context, Result, bail};
use mple_release::process::{SystemRunner, ThreadDelay};
use mple_release::tasks::{TaskOptions, TaskRunner};
use mple_release::workflow::{Event, JobRunner, WORKFLOW_PATH, Workflow};
use std::fs;
use tracing::info;

/// Runs every job of the workflow on this machine, as CI would.
///
/// # Errors
/// Returns the error of the first failing step.
pub fn run_locally(workspace: &Workspace) -> Result<()> {
    let workflow = Workflow::standard(&workspace.settings)?;
    let tasks = workspace.tasks(&TaskOptions::default())?;
    let mut jobs = JobRunner::new(TaskRunner::new(&tasks, SystemRunner, ThreadDelay));

    for job in &workflow.jobs {
        jobs.run(job).with_context(|| format!("CI job '{}' failed", job.id))?;
    }
    Ok(())
}

/// Prints whether the event would start the workflow, and in which concurrency group.
///
/// # Errors
/// Returns an error if the workflow cannot be built from the settings.
pub fn check_trigger(
    workspace: &Workspace,
    kind: EventKind,
    git_ref: &str,
    changed: &[String],
) -> Result<()> {
    let workflow = Workflow::standard(&workspace.settings)?;
    let event = match kind {
        EventKind::Push => Event::Push { git_ref: git_ref.to_owned() },
        EventKind::PullRequest => Event::PullRequest { git_ref: git_ref.to_owned() },
    };

    let decision = workflow.evaluate(&event, changed);
    println!("{decision}");
    if decision.should_run() {
        println!("concurrency group: {}", workflow.concurrency_group(&event));
    }
    Ok(())
}

/// Writes the workflow file, or verifies it when `check` is set.
///
/// # Errors
/// Returns an error if the file cannot be read or written, or is stale in check mode.
pub fn render(workspace: &Workspace, check: bool) -> Result<()> {
    let rendered = Workflow::standard(&workspace.settings)?.render();
    let path = workspace.root.join(WORKFLOW_PATH);

    if check {
        let current = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if current != rendered {
            bail!("{WORKFLOW_PATH} is out of date; run `cargo xtask ci render`");
        }
        println!("✅ {WORKFLOW_PATH} is up to date.");
        return Ok(());
    }

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    fs::write(&path, rendered).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Workflow written");
    Ok(())
}
