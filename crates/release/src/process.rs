//! Process execution seam.
//!
//! Every external program the tooling starts goes through [`CommandRunner`], so the
//! orchestration logic can be exercised with recording fakes instead of real cargo.

use crate::error::{ReleaseErrorExt, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, trace};

/// A fully described program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child. `None` inherits the driver's directory.
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: None, env: Vec::new() }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, vars: &[(String, String)]) -> Self {
        self.env.extend(vars.iter().cloned());
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status of a finished child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    /// `None` when the child was terminated by a signal.
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub const SUCCESS: Self = Self { code: Some(0) };

    #[must_use]
    pub const fn code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    #[must_use]
    pub const fn signalled() -> Self {
        Self { code: None }
    }

    #[must_use]
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("termination by signal"),
        }
    }
}

/// Runs external programs.
pub trait CommandRunner {
    /// Runs `command` to completion.
    ///
    /// # Errors
    /// Fails only when the program cannot be started; a non-zero exit is reported
    /// through the returned [`ExitOutcome`].
    fn run(&self, command: &CommandSpec) -> Result<ExitOutcome>;

    /// Reports whether `program` can be started at all.
    fn is_available(&self, program: &str) -> bool;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        (**self).run(command)
    }

    fn is_available(&self, program: &str) -> bool {
        (**self).is_available(program)
    }
}

/// Runs programs with `std::process`, inheriting the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &CommandSpec) -> Result<ExitOutcome> {
        let mut process = Command::new(&command.program);
        process.args(&command.args).stdin(Stdio::inherit()).stdout(Stdio::inherit());
        if let Some(dir) = &command.cwd {
            process.current_dir(dir);
        }
        process.envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        debug!(cwd = %display_cwd(command.cwd.as_deref()), "Running `{command}`");

        let status = process.status().context(format!("Failed to execute `{command}`"))?;
        Ok(ExitOutcome { code: status.code() })
    }

    fn is_available(&self, program: &str) -> bool {
        let available = Command::new(program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok_and(|s| s.success());
        trace!(program, available, "Probed tool");
        available
    }
}

fn display_cwd(cwd: Option<&Path>) -> String {
    cwd.map_or_else(|| ".".to_owned(), |p| p.display().to_string())
}

/// Waits between steps that must not run back to back.
pub trait Delay {
    fn wait(&self, duration: Duration);
}

impl<D: Delay + ?Sized> Delay for &D {
    fn wait(&self, duration: Duration) {
        (**self).wait(duration);
    }
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_joins_program_and_args() {
        let cmd = CommandSpec::new("cargo").args(["publish", "--dry-run"]).current_dir("pkg");
        assert_eq!(cmd.to_string(), "cargo publish --dry-run");
    }

    #[test]
    fn only_zero_is_success() {
        assert!(ExitOutcome::SUCCESS.success());
        assert!(!ExitOutcome::code(101).success());
        assert!(!ExitOutcome::signalled().success());
        assert_eq!(ExitOutcome::signalled().to_string(), "termination by signal");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = SystemRunner
            .run(&CommandSpec::new("mple-definitely-not-installed"))
            .expect_err("spawn must fail");
        assert!(err.to_string().contains("Failed to execute"), "unexpected: {err}");
        assert!(!SystemRunner.is_available("mple-definitely-not-installed"));
    }
}
