//! CI workflow model.
//!
//! The workflow is described in Rust and rendered to GitHub Actions YAML, so the trigger
//! and concurrency rules that decide whether CI runs can be tested and replayed locally.

mod concurrency;
mod job;
pub mod pattern;
mod render;
mod triggers;

pub use concurrency::{
    Admission, Concurrency, REF_PLACEHOLDER, RunId, RunScheduler, RunState, WORKFLOW_PLACEHOLDER,
};
pub use job::{Job, JobRunner, Step};
pub use triggers::{Event, TriggerDecision, Triggers};

use crate::error::Result;
use crate::settings::Settings;
use crate::tasks::{BUILD, CHECK_CODE, TEST};

/// Location of the rendered workflow, relative to the workspace root.
pub const WORKFLOW_PATH: &str = ".github/workflows/ci.yml";
pub const DEFAULT_JOB: &str = "build-and-test";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub triggers: Triggers,
    pub concurrency: Concurrency,
    pub env: Vec<(String, String)>,
    pub jobs: Vec<Job>,
}

impl Workflow {
    /// The workspace CI: toolchain with the wasm target, the wasm tool, then
    /// `build`, `check_code` and `test`.
    ///
    /// # Errors
    /// Returns [`crate::ReleaseError::InvalidConfiguration`] for malformed `env` settings.
    pub fn standard(settings: &Settings) -> Result<Self> {
        let ci = &settings.ci;
        let task =
            |name: &str, task: &str| Step::RunTask { name: name.to_owned(), task: task.to_owned() };

        let job = Job {
            id: DEFAULT_JOB.to_owned(),
            name: "Build and test".to_owned(),
            runs_on: ci.runs_on.clone(),
            steps: vec![
                Step::Checkout,
                Step::InstallToolchain {
                    toolchain: ci.toolchain.clone(),
                    targets: vec![settings.build.wasm_target.clone()],
                    components: ci.components.clone(),
                },
                Step::InstallTool {
                    binary: settings.build.wasm_tool.clone(),
                    crate_name: ci.wasm_tool_crate.clone(),
                },
                task("Build", BUILD),
                task("Check code", CHECK_CODE),
                task("Test", TEST),
            ],
        };

        Ok(Self {
            name: ci.workflow.clone(),
            triggers: Triggers::from_settings(ci),
            concurrency: Concurrency::per_ref(ci.cancel_in_progress),
            env: settings.environment()?,
            jobs: vec![job],
        })
    }

    pub fn evaluate<S: AsRef<str>>(&self, event: &Event, changed_paths: &[S]) -> TriggerDecision {
        self.triggers.evaluate(event, changed_paths)
    }

    /// Concurrency group of a run started by `event`.
    #[must_use]
    pub fn concurrency_group(&self, event: &Event) -> String {
        self.concurrency.resolve(&self.name, event.git_ref())
    }

    #[must_use]
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }
}
