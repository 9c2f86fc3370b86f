use anyhow::{Context, Result};
use mple_release::publish::{OutcomeStatus, PublishReport};
use mple_release::tasks::{TaskOptions, TaskRegistry};
use mple_release::{Settings, load_settings};
use std::path::{Path, PathBuf};

/// Returns the root directory of the project.
///
/// # Errors
/// Returns an error if the manifest directory does not have a parent.
pub fn get_project_root() -> Result<PathBuf> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .context("Could not find project root from xtask manifest")
}

/// Everything a handler needs: where the workspace is and how it is configured.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
}

impl Workspace {
    /// Locates the workspace and loads its settings.
    ///
    /// # Errors
    /// Returns an error if the settings cannot be loaded or are invalid.
    pub fn load(config: Option<&Path>) -> Result<Self> {
        let root = get_project_root()?;
        let settings = load_settings(&root, config).context("Failed to load xtask settings")?;
        Ok(Self { root, settings })
    }

    /// Builds the standard task registry for this workspace.
    ///
    /// # Errors
    /// Returns an error if the `env` settings are malformed.
    pub fn tasks(&self, options: &TaskOptions) -> Result<TaskRegistry> {
        Ok(TaskRegistry::standard(&self.root, &self.settings, options)?)
    }
}

/// Prints a formatted table of tasks with their name, dependencies and description.
pub fn render_task_table(tasks: &TaskRegistry) {
    println!("\nTasks:\n");
    println!("{:<12} {:<12} {:<50}", "Name", "Depends on", "Description");
    println!("{:-<76}", "");

    for task in tasks.list() {
        let deps = if task.dependencies.is_empty() {
            "-".to_owned()
        } else {
            task.dependencies.join(", ")
        };
        println!("{:<12} {:<12} {:<50}", task.name, deps, task.description);
    }
    println!();
}

/// Prints one row per publish target with its outcome.
pub fn render_publish_table(report: &PublishReport) {
    let title = if report.dry_run { "Publish report (dry run)" } else { "Publish report" };
    println!("\n{title}:\n");
    println!("{:<28} {:<22} {:<10} {:<30}", "Path", "Package", "Status", "Details");
    println!("{:-<92}", "");

    for outcome in &report.outcomes {
        let package = match (&outcome.package, &outcome.version) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (Some(name), None) => name.clone(),
            _ => "unknown".to_owned(),
        };
        let (status, details) = match &outcome.status {
            OutcomeStatus::Published => ("published", ""),
            OutcomeStatus::Skipped { reason } => ("skipped", reason.as_str()),
            OutcomeStatus::Failed { reason } => ("failed", reason.as_str()),
        };
        println!(
            "{:<28} {:<22} {:<10} {:<30}",
            outcome.path.display(),
            package,
            status,
            details
        );
    }
    println!();
}
