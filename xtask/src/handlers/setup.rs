use crate::services::utils::Workspace;
use anyhow::Result;
use mple_release::process::{SystemRunner, ThreadDelay};
use mple_release::tasks::{TaskOptions, TaskRunner};
use mple_release::workflow::{JobRunner, Step};
use tracing::info;

/// Tools that are convenient locally but not required by CI.
const OPTIONAL_TOOLS: &[(&str, &str)] = &[("cargo-nextest", "cargo-nextest")];

/// Set up the development environment for the workspace.
///
/// Adds the wasm target and the CI components to the active toolchain and installs the
/// wasm post-processing tool, skipping anything that is already present.
///
/// # Errors
/// Returns an error if `rustup` or `cargo install` fails.
pub fn setup_project(workspace: &Workspace) -> Result<()> {
    info!("🛠️  Starting mple development setup...");

    let settings = &workspace.settings;
    let mut steps = vec![
        Step::InstallToolchain {
            toolchain: settings.ci.toolchain.clone(),
            targets: vec![settings.build.wasm_target.clone()],
            components: settings.ci.components.clone(),
        },
        Step::InstallTool {
            binary: settings.build.wasm_tool.clone(),
            crate_name: settings.ci.wasm_tool_crate.clone(),
        },
    ];
    steps.extend(OPTIONAL_TOOLS.iter().map(|(binary, crate_name)| Step::InstallTool {
        binary: (*binary).to_owned(),
        crate_name: (*crate_name).to_owned(),
    }));

    let tasks = workspace.tasks(&TaskOptions::default())?;
    let mut jobs = JobRunner::new(TaskRunner::new(&tasks, SystemRunner, ThreadDelay));
    for step in &steps {
        jobs.run_step(step)?;
    }

    info!("✨ Setup complete! You are ready to develop for mple.");
    Ok(())
}
