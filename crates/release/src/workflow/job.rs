use crate::error::{ReleaseError, ReleaseErrorExt, Result};
use crate::process::{CommandRunner, CommandSpec, Delay};
use crate::tasks::TaskRunner;
use tracing::{debug, info};

/// One step of a CI job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Checkout,
    InstallToolchain { toolchain: String, targets: Vec<String>, components: Vec<String> },
    /// Installs `binary` from the crate `crate_name` unless it is already available.
    InstallTool { binary: String, crate_name: String },
    RunTask { name: String, task: String },
}

impl Step {
    #[must_use]
    pub fn title(&self) -> String {
        match self {
            Self::Checkout => "Checkout".to_owned(),
            Self::InstallToolchain { .. } => "Install Rust toolchain".to_owned(),
            Self::InstallTool { binary, .. } => format!("Install {binary}"),
            Self::RunTask { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub runs_on: String,
    pub steps: Vec<Step>,
}

/// Executes a [`Job`] on the local machine.
///
/// Steps run in order and the first failure ends the job, as on CI. Checkout is a no-op
/// locally and the toolchain step only adds targets and components to the active toolchain.
#[derive(Debug)]
pub struct JobRunner<'a, R, D> {
    tasks: TaskRunner<'a, R, D>,
}

impl<'a, R: CommandRunner, D: Delay> JobRunner<'a, R, D> {
    pub const fn new(tasks: TaskRunner<'a, R, D>) -> Self {
        Self { tasks }
    }

    /// # Errors
    /// Returns the error of the first failing step, with the step title as context.
    pub fn run(&mut self, job: &Job) -> Result<()> {
        info!(job = %job.id, steps = job.steps.len(), "Running job '{}'", job.name);
        for step in &job.steps {
            self.run_step(step).context(format!("step '{}'", step.title()))?;
        }
        info!(job = %job.id, "Job succeeded");
        Ok(())
    }

    /// # Errors
    /// Spawn failures, non-zero exits and task errors.
    pub fn run_step(&mut self, step: &Step) -> Result<()> {
        info!("▶ {}", step.title());
        match step {
            Step::Checkout => {
                debug!("Checkout is a no-op for local runs");
                Ok(())
            },
            Step::InstallToolchain { toolchain, targets, components } => {
                debug!(toolchain, "Using the active toolchain");
                if !targets.is_empty() {
                    self.exec(CommandSpec::new("rustup").args(["target", "add"]).args(targets))?;
                }
                if !components.is_empty() {
                    self.exec(
                        CommandSpec::new("rustup").args(["component", "add"]).args(components),
                    )?;
                }
                Ok(())
            },
            Step::InstallTool { binary, crate_name } => {
                if self.tasks.runner().is_available(binary) {
                    info!("✅ {binary} is already installed.");
                    return Ok(());
                }
                info!("📥 Installing {crate_name}...");
                self.exec(
                    CommandSpec::new("cargo").args(["install", crate_name.as_str(), "--locked"]),
                )
            },
            Step::RunTask { task, .. } => self.tasks.run(task).map(|_| ()),
        }
    }

    fn exec(&self, command: CommandSpec) -> Result<()> {
        let exit = self.tasks.runner().run(&command)?;
        if exit.success() {
            return Ok(());
        }
        Err(ReleaseError::CommandFailed {
            command: command.to_string(),
            status: exit.to_string(),
            context: None,
        })
    }
}
