//! Layered settings for the tooling.
//!
//! Values come from, in increasing priority:
//! 1. compiled-in defaults,
//! 2. an optional `xtask.toml` (or an explicit file),
//! 3. environment variables prefixed with `MPLE__`, nested with `__`
//!    (e.g. `MPLE__PUBLISH__DELAY_SECS=0` maps to `publish.delay_secs`).

use crate::error::{ReleaseError, ReleaseErrorExt, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const SETTINGS_FILE: &str = "xtask.toml";
pub const ENV_PREFIX: &str = "MPLE";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `KEY=VALUE` pairs exported to every command the tooling spawns.
    pub env: Vec<String>,
    pub publish: PublishSettings,
    pub build: BuildSettings,
    pub test: TestSettings,
    pub ci: CiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: vec!["RUST_BACKTRACE=full".to_owned()],
            publish: PublishSettings::default(),
            build: BuildSettings::default(),
            test: TestSettings::default(),
            ci: CiSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PublishSettings {
    /// Package directories, relative to the workspace root, in publish order.
    pub targets: Vec<PathBuf>,
    /// Pause between two publish invocations so the registry index catches up.
    pub delay_secs: u64,
    pub dry_run: bool,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            targets: vec![PathBuf::from("src/ic_mple_pocket_ic")],
            delay_secs: 10,
            dry_run: false,
        }
    }
}

impl PublishSettings {
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// Canisters whose wasm the PocketIC integration tests load from
/// `target/wasm32-unknown-unknown/release/`.
pub const DEFAULT_WASM_PACKAGES: &[&str] = &[
    "test_canister",
    "ic_mple_structures_integration_tests",
    "ic_mple_scheduler_integration_tests",
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub wasm_target: String,
    /// Packages compiled to wasm and shrunk after the native build.
    pub wasm_packages: Vec<String>,
    pub wasm_tool: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            wasm_target: "wasm32-unknown-unknown".to_owned(),
            wasm_packages: DEFAULT_WASM_PACKAGES.iter().map(|p| (*p).to_owned()).collect(),
            wasm_tool: "ic-wasm".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TestSettings {
    pub depends_on_build: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CiSettings {
    pub workflow: String,
    pub branches: Vec<String>,
    pub pull_request: bool,
    pub paths_ignore: Vec<String>,
    pub cancel_in_progress: bool,
    pub runs_on: String,
    pub toolchain: String,
    pub components: Vec<String>,
    /// Crate providing the wasm tool binary named in [`BuildSettings::wasm_tool`].
    pub wasm_tool_crate: String,
}

impl Default for CiSettings {
    fn default() -> Self {
        Self {
            workflow: "CI".to_owned(),
            branches: vec!["main".to_owned()],
            pull_request: true,
            paths_ignore: vec!["README.md".to_owned()],
            cancel_in_progress: true,
            runs_on: "ubuntu-latest".to_owned(),
            toolchain: "stable".to_owned(),
            components: vec!["rustfmt".to_owned(), "clippy".to_owned()],
            wasm_tool_crate: "ic-wasm".to_owned(),
        }
    }
}

impl Settings {
    /// Parses [`Settings::env`] into `(key, value)` pairs, keeping their order.
    ///
    /// # Errors
    /// Returns [`ReleaseError::InvalidConfiguration`] for entries without `=` or with an
    /// empty key.
    pub fn environment(&self) -> Result<Vec<(String, String)>> {
        self.env
            .iter()
            .map(|entry| {
                let (key, value) = entry.split_once('=').ok_or_else(|| {
                    ReleaseError::InvalidConfiguration {
                        message: format!("env entry '{entry}' is not KEY=VALUE").into(),
                        context: None,
                    }
                })?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(ReleaseError::InvalidConfiguration {
                        message: format!("env entry '{entry}' has an empty key").into(),
                        context: None,
                    });
                }
                Ok((key.to_owned(), value.to_owned()))
            })
            .collect()
    }

    /// Checks values that deserialize fine but cannot drive a run.
    ///
    /// # Errors
    /// Returns [`ReleaseError::InvalidConfiguration`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.environment()?;

        if self.publish.targets.iter().any(|t| t.as_os_str().is_empty()) {
            return Err(ReleaseError::InvalidConfiguration {
                message: "publish.targets contains an empty path".into(),
                context: None,
            });
        }
        if self.build.wasm_target.trim().is_empty() {
            return Err(ReleaseError::InvalidConfiguration {
                message: "build.wasm_target cannot be empty".into(),
                context: None,
            });
        }
        if self.ci.workflow.trim().is_empty() {
            return Err(ReleaseError::InvalidConfiguration {
                message: "ci.workflow cannot be empty".into(),
                context: None,
            });
        }
        Ok(())
    }
}

/// Builds [`Settings`] from a file and environment overrides.
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file: Option<(PathBuf, bool)>,
    vars: Option<config::Map<String, String>>,
}

impl SettingsLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a TOML file. A missing optional file is ignored.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>, required: bool) -> Self {
        self.file = Some((path.into(), required));
        self
    }

    /// Replaces the process environment with `vars` for override lookup.
    #[must_use]
    pub fn vars(mut self, vars: config::Map<String, String>) -> Self {
        self.vars = Some(vars);
        self
    }

    /// Builds, deserializes and validates the settings.
    ///
    /// # Errors
    /// Returns [`ReleaseError::Config`] when a required file is missing or a value has the
    /// wrong shape, and [`ReleaseError::InvalidConfiguration`] when validation fails.
    pub fn load(self) -> Result<Settings> {
        let mut builder = Config::builder();

        if let Some((path, required)) = &self.file {
            debug!(path = %path.display(), required, "Loading settings file");
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("env")
                .with_list_parse_key("publish.targets")
                .with_list_parse_key("build.wasm_packages")
                .with_list_parse_key("ci.branches")
                .with_list_parse_key("ci.paths_ignore")
                .source(self.vars),
        );

        let settings = builder
            .build()
            .context("Failed to build settings")?
            .try_deserialize::<Settings>()
            .context("Failed to deserialize settings")?;

        settings.validate()?;
        Ok(settings)
    }
}

/// Loads settings from `path`, or from the optional `xtask.toml` under `root`.
///
/// # Errors
/// See [`SettingsLoader::load`].
pub fn load_settings(root: &Path, path: Option<&Path>) -> Result<Settings> {
    let loader = match path {
        Some(path) => SettingsLoader::new().file(path, true),
        None => SettingsLoader::new().file(root.join(SETTINGS_FILE), false),
    };
    loader.load()
}
