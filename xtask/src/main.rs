#![warn(rust_2018_idioms, unused_lifetimes)]
#![allow(
    clippy::print_stderr,
    clippy::print_stdout,
    clippy::disallowed_methods,
    clippy::disallowed_types
)]

pub mod handlers;
pub mod models;
pub mod services;

use crate::handlers::{ci, publish, setup, tasks};
use crate::models::args::{AppCommands, CiAction, Cli};
use crate::services::utils::Workspace;

use anyhow::Result;
use clap::Parser;
use mple_logger::{LogFormat, Logger};
use mple_release::tasks::{BUILD, CHECK_CODE};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = Logger::builder("xtask").verbosity(cli.verbose, cli.quiet);
    if let Some(dir) = &cli.log_dir {
        logger = logger.directory(dir).format(LogFormat::Json);
    }
    let _logger = logger.init()?;

    let workspace = Workspace::load(cli.config.as_deref())?;

    match cli.command {
        AppCommands::Build {} => {
            tasks::run_task(&workspace, BUILD)?;
        },
        AppCommands::CheckCode {} => {
            tasks::run_task(&workspace, CHECK_CODE)?;
        },
        AppCommands::Test { project } => tasks::run_tests(&workspace, project.as_deref())?,
        AppCommands::Publish(args) => publish::publish(&workspace, &args)?,
        AppCommands::Tasks {} => tasks::list_tasks(&workspace)?,
        AppCommands::Setup {} => setup::setup_project(&workspace)?,
        AppCommands::Ci { action } => match action {
            CiAction::Run {} => ci::run_locally(&workspace)?,
            CiAction::Check { event, git_ref, changed } => {
                ci::check_trigger(&workspace, event, &git_ref, &changed)?;
            },
            CiAction::Render { check } => ci::render(&workspace, check)?,
        },
    }

    Ok(())
}
