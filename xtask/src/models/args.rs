//! # CLI Argument Definitions
//!
//! This module defines the command-line interface (CLI) structure using the `clap` crate.
//! Global flags control settings lookup and logging; subcommands map onto workspace tasks
//! and the CI workflow.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// The main CLI structure parsing command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "cargo xtask")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Release and CI toolkit for the mple workspace")]
pub struct Cli {
    /// Settings file (defaults to `xtask.toml` in the workspace root, if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write logs into this directory (switches to JSON output)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// The main subcommand to execute.
    #[command(subcommand)]
    pub command: AppCommands,
}

/// Enumeration of available application subcommands.
#[derive(Debug, Subcommand)]
pub enum AppCommands {
    /// Build the workspace and the configured wasm packages
    Build {},
    /// Check formatting and run clippy
    #[command(alias = "check_code")]
    CheckCode {},
    /// Run tests (workspace by default)
    Test {
        /// Run tests for a specific package ('all' means the whole workspace)
        project: Option<String>,
    },
    /// Publish the configured packages to crates.io, in order
    Publish(PublishArgs),
    /// List the available tasks
    Tasks {},
    /// Install the wasm target and tools needed for development
    Setup {},
    /// Work with the CI workflow
    Ci {
        #[command(subcommand)]
        action: CiAction,
    },
}

#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Pass `--dry-run` to every `cargo publish`
    #[arg(long)]
    pub dry_run: bool,

    /// Seconds to wait between packages (overrides the settings)
    #[arg(long, value_name = "SECS")]
    pub delay: Option<u64>,

    /// Print the report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Exit successfully even when some packages failed to publish
    #[arg(long)]
    pub no_fail: bool,
}

/// Enumeration of CI subcommands.
#[derive(Debug, Subcommand)]
pub enum CiAction {
    /// Run the CI job on this machine
    Run {},
    /// Decide whether an event would trigger the workflow
    Check {
        #[arg(long, value_enum)]
        event: EventKind,

        /// Git ref of the event (e.g. 'refs/heads/main')
        #[arg(long = "ref", value_name = "REF")]
        git_ref: String,

        /// A changed path; repeat for every file in the change set
        #[arg(long = "changed", value_name = "PATH")]
        changed: Vec<String>,
    },
    /// Write the GitHub Actions workflow file
    Render {
        /// Fail if the checked-in file is out of date instead of writing it
        #[arg(long)]
        check: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EventKind {
    Push,
    PullRequest,
}
