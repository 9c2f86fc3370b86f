//! Named tasks with dependencies and a shared environment.
//!
//! The workspace exposes four tasks: `build`, `check_code`, `test` and `publish`. Names are
//! matched case-insensitively and `-` is equivalent to `_`, so `check-code` resolves to
//! `check_code`. Execution is sequential and stops at the first failing command.

use crate::error::{ReleaseError, ReleaseErrorExt, Result};
use crate::process::{CommandRunner, CommandSpec, Delay};
use crate::publish::{PublishPlan, PublishReport, Publisher};
use crate::settings::Settings;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

pub const BUILD: &str = "build";
pub const CHECK_CODE: &str = "check_code";
pub const TEST: &str = "test";
pub const PUBLISH: &str = "publish";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Commands executed in order; the first failure aborts the task.
    Commands(Vec<CommandSpec>),
    /// Runs the publish driver.
    Publish(PublishPlan),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub action: TaskAction,
}

impl Task {
    pub fn commands(
        name: &str,
        description: impl Into<String>,
        commands: Vec<CommandSpec>,
    ) -> Self {
        Self {
            name: normalize_task_name(name),
            description: description.into(),
            dependencies: Vec::new(),
            action: TaskAction::Commands(commands),
        }
    }

    #[must_use]
    pub fn depends_on(mut self, task: &str) -> Self {
        self.dependencies.push(normalize_task_name(task));
        self
    }
}

/// Per-invocation knobs that are not part of the persisted settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOptions {
    /// Restricts `test` to one package.
    pub test_package: Option<String>,
    /// Use `cargo nextest` instead of `cargo test`.
    pub nextest: bool,
}

/// Canonical form of a task name or alias.
#[must_use]
pub fn normalize_task_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Task>,
}

impl TaskRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `task`, returning the definition it replaced.
    pub fn register(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.name.clone(), task)
    }

    /// The workspace task set rooted at `root`.
    ///
    /// # Errors
    /// Returns [`ReleaseError::InvalidConfiguration`] for malformed `env` settings.
    pub fn standard(root: &Path, settings: &Settings, options: &TaskOptions) -> Result<Self> {
        let env = settings.environment()?;
        let cargo = || CommandSpec::new("cargo").current_dir(root).envs(&env);

        let mut build = vec![cargo().args(["build", "--workspace", "--all-targets"])];
        for package in &settings.build.wasm_packages {
            let wasm = format!(
                "target/{}/release/{}.wasm",
                settings.build.wasm_target,
                package.replace('-', "_")
            );
            build.push(cargo().args([
                "build",
                "--target",
                settings.build.wasm_target.as_str(),
                "--release",
                "-p",
                package.as_str(),
            ]));
            build.push(
                CommandSpec::new(settings.build.wasm_tool.as_str())
                    .args([wasm.as_str(), "-o", wasm.as_str(), "shrink"])
                    .current_dir(root)
                    .envs(&env),
            );
        }

        let check_code = vec![
            cargo().args(["fmt", "--all", "--", "--check"]),
            cargo().args([
                "clippy",
                "--workspace",
                "--all-targets",
                "--all-features",
                "--",
                "-D",
                "warnings",
            ]),
        ];

        let mut test_args: Vec<String> = if options.nextest {
            vec!["nextest".into(), "run".into()]
        } else {
            vec!["test".into()]
        };
        match &options.test_package {
            Some(package) => test_args.extend(["-p".into(), package.clone()]),
            None => test_args.push("--workspace".into()),
        }
        test_args.push("--all-features".into());
        if options.nextest {
            test_args.extend(
                ["--failure-output", "immediate-final", "--success-output", "never"]
                    .map(String::from),
            );
        }

        let mut test = Task::commands(TEST, "Run the test suite", vec![cargo().args(test_args)]);
        if settings.test.depends_on_build {
            test = test.depends_on(BUILD);
        }

        let mut registry = Self::new();
        registry.register(Task::commands(BUILD, "Build the workspace and wasm packages", build));
        registry.register(Task::commands(
            CHECK_CODE,
            "Check formatting and run clippy",
            check_code,
        ));
        registry.register(test);
        registry.register(Task {
            name: PUBLISH.to_owned(),
            description: "Publish the configured packages in order".to_owned(),
            dependencies: Vec::new(),
            action: TaskAction::Publish(PublishPlan::from_settings(root, settings)?),
        });
        Ok(registry)
    }

    /// Looks up a task by name or alias.
    ///
    /// # Errors
    /// Returns [`ReleaseError::UnknownTask`] when nothing matches.
    pub fn resolve(&self, name: &str) -> Result<&Task> {
        let key = normalize_task_name(name);
        self.tasks
            .get(&key)
            .ok_or_else(|| ReleaseError::UnknownTask { name: name.to_owned(), context: None })
    }

    /// Tasks sorted by name.
    pub fn list(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Returns `name` and its transitive dependencies, dependencies first, each once.
    ///
    /// # Errors
    /// Returns [`ReleaseError::UnknownTask`] for unknown names or dependencies and
    /// [`ReleaseError::DependencyCycle`] when dependencies loop.
    pub fn plan(&self, name: &str) -> Result<Vec<&Task>> {
        let mut order = Vec::new();
        let mut done = BTreeSet::new();
        let mut stack = Vec::new();
        self.visit(name, &mut stack, &mut done, &mut order)?;
        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &str,
        stack: &mut Vec<String>,
        done: &mut BTreeSet<String>,
        order: &mut Vec<&'a Task>,
    ) -> Result<()> {
        let task = self.resolve(name)?;
        if done.contains(&task.name) {
            return Ok(());
        }
        if let Some(start) = stack.iter().position(|n| *n == task.name) {
            let mut chain = stack[start..].to_vec();
            chain.push(task.name.clone());
            return Err(ReleaseError::DependencyCycle { chain: chain.join(" -> "), context: None });
        }

        stack.push(task.name.clone());
        for dependency in &task.dependencies {
            self.resolve(dependency).context(format!("dependency of '{}'", task.name))?;
            self.visit(dependency, stack, done, order)?;
        }
        stack.pop();

        done.insert(task.name.clone());
        order.push(task);
        Ok(())
    }
}

/// What a [`TaskRunner::run`] call executed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Task names in execution order. Tasks finished earlier in the session are omitted.
    pub executed: Vec<String>,
    pub publish: Option<PublishReport>,
}

/// Executes tasks from a registry, remembering what already ran in this session.
#[derive(Debug)]
pub struct TaskRunner<'a, R, D> {
    registry: &'a TaskRegistry,
    runner: R,
    delay: D,
    completed: BTreeSet<String>,
}

impl<'a, R: CommandRunner, D: Delay> TaskRunner<'a, R, D> {
    pub const fn new(registry: &'a TaskRegistry, runner: R, delay: D) -> Self {
        Self { registry, runner, delay, completed: BTreeSet::new() }
    }

    /// Runs `name` after its dependencies.
    ///
    /// A failing publish target does not fail the task; inspect
    /// [`RunSummary::publish`] for the outcome.
    ///
    /// # Errors
    /// Resolution errors from [`TaskRegistry::plan`], spawn failures, and
    /// [`ReleaseError::CommandFailed`] for the first command with a non-zero exit.
    pub fn run(&mut self, name: &str) -> Result<RunSummary> {
        let plan = self.registry.plan(name)?;
        let mut summary = RunSummary::default();

        for task in plan {
            if self.completed.contains(&task.name) {
                debug!(task = %task.name, "Already completed in this session");
                continue;
            }

            info!(task = %task.name, "Running task");
            match &task.action {
                TaskAction::Commands(commands) => self.run_commands(&task.name, commands)?,
                TaskAction::Publish(plan) => {
                    let publisher = Publisher::new(&self.runner, &self.delay);
                    summary.publish = Some(publisher.publish_all(plan));
                },
            }

            self.completed.insert(task.name.clone());
            summary.executed.push(task.name.clone());
        }

        Ok(summary)
    }

    /// Exposes the underlying runner so callers can share it with other steps.
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    fn run_commands(&self, task: &str, commands: &[CommandSpec]) -> Result<()> {
        for command in commands {
            let exit = self.runner.run(command)?;
            if !exit.success() {
                return Err(ReleaseError::CommandFailed {
                    command: command.to_string(),
                    status: exit.to_string(),
                    context: Some(format!("task '{task}'").into()),
                });
            }
        }
        Ok(())
    }
}
