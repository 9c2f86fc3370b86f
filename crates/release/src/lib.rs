//! # Release
//!
//! Orchestration behind `cargo xtask`:
//!
//! * [`publish`]: publishes an ordered list of package directories, logging and recording
//!   failures without stopping the run.
//! * [`tasks`]: the `build`, `check_code`, `test` and `publish` tasks, their dependencies and
//!   the environment shared by everything they spawn.
//! * [`workflow`]: the CI workflow (triggers, concurrency, job steps) with a renderer for the
//!   GitHub Actions file and a local job runner.
//!
//! All process spawning goes through [`process::CommandRunner`].
//!
//! ## Example
//!
//! ```rust
//! use mple_release::workflow::{Event, Workflow};
//! use mple_release::Settings;
//!
//! let workflow = Workflow::standard(&Settings::default()).unwrap();
//! let push = Event::Push { git_ref: "refs/heads/main".into() };
//!
//! assert!(!workflow.evaluate(&push, &["README.md"]).should_run());
//! assert!(workflow.evaluate(&push, &["README.md", "src/lib.rs"]).should_run());
//! ```

mod error;
pub mod manifest;
pub mod process;
pub mod publish;
pub mod settings;
pub mod tasks;
pub mod workflow;

pub use crate::error::{ReleaseError, ReleaseErrorExt, Result};
pub use crate::settings::{Settings, SettingsLoader, load_settings};
