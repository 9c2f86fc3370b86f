#![allow(dead_code, unreachable_pub)]

use mple_release::process::{CommandRunner, CommandSpec, Delay, ExitOutcome};
use mple_release::{ReleaseError, Result};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug)]
enum Rule {
    FailIn(PathBuf, i32),
    SpawnErrorIn(PathBuf),
    FailWhen(String, i32),
}

/// Records every command instead of running it.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: RefCell<Vec<CommandSpec>>,
    rules: Vec<Rule>,
    available: HashSet<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands run inside `dir` exit with `code`.
    pub fn fail_in(mut self, dir: impl Into<PathBuf>, code: i32) -> Self {
        self.rules.push(Rule::FailIn(dir.into(), code));
        self
    }

    pub fn spawn_error_in(mut self, dir: impl Into<PathBuf>) -> Self {
        self.rules.push(Rule::SpawnErrorIn(dir.into()));
        self
    }

    /// Commands whose rendering starts with `prefix` exit with `code`.
    pub fn fail_when(mut self, prefix: &str, code: i32) -> Self {
        self.rules.push(Rule::FailWhen(prefix.to_owned(), code));
        self
    }

    pub fn with_tool(mut self, program: &str) -> Self {
        self.available.insert(program.to_owned());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.calls.borrow().iter().map(ToString::to_string).collect()
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.calls.borrow().iter().filter_map(|c| c.cwd.clone()).collect()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        self.calls.borrow_mut().push(command.clone());
        let rendered = command.to_string();

        for rule in &self.rules {
            match rule {
                Rule::FailIn(dir, code) if command.cwd.as_deref() == Some(dir.as_path()) => {
                    return Ok(ExitOutcome::code(*code));
                },
                Rule::SpawnErrorIn(dir) if command.cwd.as_deref() == Some(dir.as_path()) => {
                    return Err(ReleaseError::Io {
                        source: std::io::Error::new(std::io::ErrorKind::NotFound, "cargo not found"),
                        context: Some(format!("Failed to execute `{rendered}`").into()),
                    });
                },
                Rule::FailWhen(prefix, code) if rendered.starts_with(prefix.as_str()) => {
                    return Ok(ExitOutcome::code(*code));
                },
                _ => {},
            }
        }
        Ok(ExitOutcome::SUCCESS)
    }

    fn is_available(&self, program: &str) -> bool {
        self.available.contains(program)
    }
}

/// Records requested waits without sleeping.
#[derive(Debug, Default)]
pub struct RecordingDelay {
    waits: RefCell<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn waits(&self) -> Vec<Duration> {
        self.waits.borrow().clone()
    }
}

impl Delay for RecordingDelay {
    fn wait(&self, duration: Duration) {
        self.waits.borrow_mut().push(duration);
    }
}

/// Writes `<root>/<dir>/Cargo.toml` for a package called `name`.
pub fn write_package(root: &Path, dir: &str, name: &str, publish: Option<bool>) -> PathBuf {
    let path = root.join(dir);
    fs::create_dir_all(&path).expect("create package dir");
    let mut manifest = format!("[package]\nname = \"{name}\"\nversion = \"0.1.0\"\n");
    if let Some(publish) = publish {
        manifest.push_str(&format!("publish = {publish}\n"));
    }
    fs::write(path.join("Cargo.toml"), manifest).expect("write manifest");
    path
}
