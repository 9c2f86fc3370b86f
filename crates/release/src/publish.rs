//! Publish driver.
//!
//! Publishes an ordered list of package directories one after another. A failing entry is
//! logged and recorded, and the remaining entries are still attempted. The exit status of
//! `cargo publish` is taken from the publish invocation itself, never from a later command.

use crate::error::{ReleaseError, Result};
use crate::manifest::{MANIFEST_FILE, read_manifest};
use crate::process::{CommandRunner, CommandSpec, Delay};
use crate::settings::Settings;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};

/// What to publish and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    /// Targets are resolved against this directory.
    pub root: PathBuf,
    pub targets: Vec<PathBuf>,
    pub delay: Duration,
    pub dry_run: bool,
    pub env: Vec<(String, String)>,
}

impl PublishPlan {
    /// Builds the plan described by the `publish` and `env` settings.
    ///
    /// # Errors
    /// Returns [`ReleaseError::InvalidConfiguration`] for malformed `env` entries.
    pub fn from_settings(root: impl Into<PathBuf>, settings: &Settings) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            targets: settings.publish.targets.clone(),
            delay: settings.publish.delay(),
            dry_run: settings.publish.dry_run,
            env: settings.environment()?,
        })
    }

    fn command_for(&self, dir: &Path) -> CommandSpec {
        let mut cmd = CommandSpec::new("cargo").arg("publish");
        if self.dry_run {
            cmd = cmd.arg("--dry-run");
        }
        cmd.current_dir(dir).envs(&self.env)
    }
}

/// Result of one publish target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Published,
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub path: PathBuf,
    pub package: Option<String>,
    pub version: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl TargetOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// Outcomes of a full run, in target order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub dry_run: bool,
    pub outcomes: Vec<TargetOutcome>,
}

impl PublishReport {
    pub fn failures(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    #[must_use]
    pub fn published(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status == OutcomeStatus::Published).count()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Turns a report with failed targets into [`ReleaseError::PublishFailed`].
    ///
    /// # Errors
    /// Returns [`ReleaseError::PublishFailed`] when at least one target failed.
    pub fn into_result(self) -> Result<Self> {
        let failed = self.failures().count();
        if failed == 0 {
            return Ok(self);
        }
        Err(ReleaseError::PublishFailed { failed, total: self.outcomes.len(), context: None })
    }
}

/// Runs `cargo publish` over a [`PublishPlan`].
#[derive(Debug)]
pub struct Publisher<R, D> {
    runner: R,
    delay: D,
}

impl<R: CommandRunner, D: Delay> Publisher<R, D> {
    pub const fn new(runner: R, delay: D) -> Self {
        Self { runner, delay }
    }

    /// Publishes every target in order. Never stops early.
    ///
    /// The configured delay is observed after each `cargo publish` invocation that is
    /// followed by another target.
    pub fn publish_all(&self, plan: &PublishPlan) -> PublishReport {
        let total = plan.targets.len();
        let mut outcomes = Vec::with_capacity(total);

        info!(total, dry_run = plan.dry_run, "Publishing packages");

        for (index, target) in plan.targets.iter().enumerate() {
            let (outcome, invoked) = self.publish_one(plan, target);
            outcomes.push(outcome);

            if invoked && index + 1 < total && !plan.delay.is_zero() {
                info!("Waiting {}s before the next package", plan.delay.as_secs());
                self.delay.wait(plan.delay);
            }
        }

        let report = PublishReport { dry_run: plan.dry_run, outcomes };
        info!(
            published = report.published(),
            failed = report.failures().count(),
            "Publish run finished"
        );
        report
    }

    /// Returns the outcome and whether `cargo publish` was actually started.
    fn publish_one(&self, plan: &PublishPlan, target: &Path) -> (TargetOutcome, bool) {
        let dir = plan.root.join(target);
        let mut outcome = TargetOutcome {
            path: target.to_path_buf(),
            package: None,
            version: None,
            status: OutcomeStatus::Published,
        };

        if !dir.join(MANIFEST_FILE).is_file() {
            let reason = format!("no {MANIFEST_FILE} found in {}", dir.display());
            error!(path = %target.display(), "Failed to publish: {reason}");
            outcome.status = OutcomeStatus::Failed { reason };
            return (outcome, false);
        }

        let manifest = match read_manifest(&dir) {
            Ok(manifest) => manifest,
            Err(err) => {
                error!(path = %target.display(), "Failed to publish: {err}");
                outcome.status = OutcomeStatus::Failed { reason: err.to_string() };
                return (outcome, false);
            },
        };
        outcome.package = Some(manifest.name.clone());
        outcome.version.clone_from(&manifest.version);

        if !manifest.publishable {
            let reason = format!("{} is marked publish = false", manifest.name);
            warn!(path = %target.display(), "Skipping: {reason}");
            outcome.status = OutcomeStatus::Skipped { reason };
            return (outcome, false);
        }

        info!(
            path = %target.display(),
            version = manifest.version.as_deref().unwrap_or("workspace"),
            "Publishing {}",
            manifest.name
        );

        let command = plan.command_for(&dir);
        outcome.status = match self.runner.run(&command) {
            Ok(exit) if exit.success() => {
                info!(path = %target.display(), "Published {}", manifest.name);
                OutcomeStatus::Published
            },
            Ok(exit) => {
                let reason = format!("`{command}` ended with {exit}");
                error!(path = %target.display(), "Failed to publish: {reason}");
                OutcomeStatus::Failed { reason }
            },
            Err(err) => {
                error!(path = %target.display(), "Failed to publish: {err}");
                OutcomeStatus::Failed { reason: err.to_string() }
            },
        };
        (outcome, true)
    }
}
