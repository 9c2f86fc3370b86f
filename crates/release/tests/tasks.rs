mod fixtures;

use fixtures::{RecordingDelay, RecordingRunner, write_package};
use mple_release::process::CommandSpec;
use mple_release::tasks::{
    BUILD, CHECK_CODE, PUBLISH, TEST, Task, TaskAction, TaskOptions, TaskRegistry, TaskRunner,
};
use mple_release::{ReleaseError, Settings};
use std::path::{Path, PathBuf};

fn registry(root: &Path, settings: &Settings, options: &TaskOptions) -> TaskRegistry {
    TaskRegistry::standard(root, settings, options).expect("standard tasks")
}

fn commands(task: &Task) -> &[CommandSpec] {
    match &task.action {
        TaskAction::Commands(commands) => commands,
        TaskAction::Publish(_) => panic!("{} is not a command task", task.name),
    }
}

#[test]
fn aliases_resolve_to_canonical_names() {
    let tasks = registry(Path::new("."), &Settings::default(), &TaskOptions::default());

    for alias in ["check_code", "check-code", "CHECK-CODE", " check_code "] {
        assert_eq!(tasks.resolve(alias).expect("known alias").name, CHECK_CODE);
    }
    let names: Vec<_> = tasks.list().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec![BUILD, CHECK_CODE, PUBLISH, TEST]);

    let err = tasks.resolve("lint").expect_err("unknown task");
    assert!(matches!(err, ReleaseError::UnknownTask { ref name, .. } if name == "lint"));
}

#[test]
fn every_spawned_command_gets_the_shared_environment_and_root() {
    let root = PathBuf::from("/work/mple");
    let mut settings = Settings::default();
    settings.build.wasm_packages = vec!["test-canister".to_owned()];
    let tasks = registry(&root, &settings, &TaskOptions::default());

    for name in [BUILD, CHECK_CODE, TEST] {
        for command in commands(tasks.resolve(name).expect("task")) {
            assert!(
                command.env.contains(&("RUST_BACKTRACE".to_owned(), "full".to_owned())),
                "missing env in `{command}`"
            );
            assert_eq!(command.cwd.as_deref(), Some(root.as_path()));
        }
    }
}

#[test]
fn build_compiles_and_shrinks_wasm_packages() {
    let mut settings = Settings::default();
    settings.build.wasm_packages = vec!["test-canister".to_owned()];
    let tasks = registry(Path::new("."), &settings, &TaskOptions::default());

    let rendered: Vec<String> =
        commands(tasks.resolve(BUILD).expect("build")).iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "cargo build --workspace --all-targets",
            "cargo build --target wasm32-unknown-unknown --release -p test-canister",
            "ic-wasm target/wasm32-unknown-unknown/release/test_canister.wasm -o \
             target/wasm32-unknown-unknown/release/test_canister.wasm shrink",
        ]
    );
}

#[test]
fn test_task_prefers_nextest_and_scopes_to_a_package() {
    let plain = registry(Path::new("."), &Settings::default(), &TaskOptions::default());
    assert_eq!(
        commands(plain.resolve(TEST).expect("test"))[0].to_string(),
        "cargo test --workspace --all-features"
    );

    let options =
        TaskOptions { test_package: Some("ic-mple-log".to_owned()), nextest: true };
    let scoped = registry(Path::new("."), &Settings::default(), &options);
    assert_eq!(
        commands(scoped.resolve(TEST).expect("test"))[0].to_string(),
        "cargo nextest run -p ic-mple-log --all-features --failure-output immediate-final \
         --success-output never"
    );
}

#[test]
fn check_code_stops_at_the_first_failure() {
    let tasks = registry(Path::new("."), &Settings::default(), &TaskOptions::default());
    let runner = RecordingRunner::new().fail_when("cargo fmt", 1);
    let mut run = TaskRunner::new(&tasks, &runner, RecordingDelay::default());

    let err = run.run("check-code").expect_err("fmt fails");
    assert!(matches!(err, ReleaseError::CommandFailed { .. }));
    assert!(err.to_string().contains("task 'check_code'"), "unexpected: {err}");
    assert_eq!(runner.rendered(), vec!["cargo fmt --all -- --check".to_owned()]);
}

#[test]
fn dependencies_run_first_and_only_once_per_session() {
    let mut settings = Settings::default();
    settings.test.depends_on_build = true;
    let tasks = registry(Path::new("."), &settings, &TaskOptions::default());

    let plan: Vec<_> = tasks.plan(TEST).expect("plan").iter().map(|t| t.name.clone()).collect();
    assert_eq!(plan, vec![BUILD, TEST]);

    let runner = RecordingRunner::new();
    let mut run = TaskRunner::new(&tasks, &runner, RecordingDelay::default());
    assert_eq!(run.run(BUILD).expect("build").executed, vec![BUILD]);
    assert_eq!(run.run(TEST).expect("test").executed, vec![TEST]);

    let builds =
        runner.rendered().iter().filter(|c| c.starts_with("cargo build --workspace")).count();
    assert_eq!(builds, 1);
}

#[test]
fn dependency_cycles_are_reported_with_their_chain() {
    let mut tasks = TaskRegistry::new();
    tasks.register(Task::commands("a", "first", Vec::new()).depends_on("b"));
    tasks.register(Task::commands("b", "second", Vec::new()).depends_on("a"));

    let err = tasks.plan("a").expect_err("cycle");
    match err {
        ReleaseError::DependencyCycle { chain, .. } => assert_eq!(chain, "a -> b -> a"),
        other => panic!("expected cycle, got {other}"),
    }
}

#[test]
fn unknown_dependency_names_the_dependent_task() {
    let mut tasks = TaskRegistry::new();
    tasks.register(Task::commands("docs", "docs", Vec::new()).depends_on("render"));

    let err = tasks.plan("docs").expect_err("unknown dependency");
    assert!(matches!(err, ReleaseError::UnknownTask { .. }));
    assert!(err.to_string().contains("dependency of 'docs'"), "unexpected: {err}");
}

#[test]
fn publish_task_reports_without_failing() {
    let tmp = tempfile::tempdir().expect("tempdir");
    write_package(tmp.path(), "src/ic_mple_pocket_ic", "ic-mple-pocket-ic", None);
    let target = tmp.path().join("src/ic_mple_pocket_ic");

    let tasks = registry(tmp.path(), &Settings::default(), &TaskOptions::default());
    let runner = RecordingRunner::new().fail_in(&target, 101);
    let mut run = TaskRunner::new(&tasks, &runner, RecordingDelay::default());

    let summary = run.run(PUBLISH).expect("publish task completes");
    let report = summary.publish.expect("publish report");
    assert_eq!(report.failures().count(), 1);
    assert_eq!(runner.dirs(), vec![target]);
}

#[test]
fn nested_unknown_dependency_names_its_direct_dependent() {
    let mut tasks = TaskRegistry::new();
    tasks.register(Task::commands("release", "release", Vec::new()).depends_on("docs"));
    tasks.register(Task::commands("docs", "docs", Vec::new()).depends_on("render"));

    let err = tasks.plan("release").expect_err("unknown dependency");
    assert!(matches!(err, ReleaseError::UnknownTask { ref name, .. } if name == "render"));
    assert!(err.to_string().contains("dependency of 'docs'"), "unexpected: {err}");
}
