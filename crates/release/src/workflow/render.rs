use super::{Job, Step, Workflow};
use std::fmt::Write;

const HEADER: &str = "# Generated by `cargo xtask ci render`. Do not edit by hand.";
const CHECKOUT_ACTION: &str = "actions/checkout@v4";
const TOOLCHAIN_ACTION: &str = "dtolnay/rust-toolchain@master";

impl Workflow {
    /// Renders the workflow as GitHub Actions YAML.
    ///
    /// Empty sections (no branches, no ignored paths, no env) are omitted.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        line(&mut out, 0, HEADER);
        line(&mut out, 0, &format!("name: {}", self.name));
        out.push('\n');

        line(&mut out, 0, "on:");
        if self.triggers.pull_request {
            line(&mut out, 1, "pull_request:");
            list(&mut out, 2, "paths-ignore", &self.triggers.paths_ignore);
        }
        if !self.triggers.push_branches.is_empty() {
            line(&mut out, 1, "push:");
            list(&mut out, 2, "branches", &self.triggers.push_branches);
            list(&mut out, 2, "paths-ignore", &self.triggers.paths_ignore);
        }
        out.push('\n');

        line(&mut out, 0, "concurrency:");
        line(&mut out, 1, &format!("group: {}", self.concurrency.group));
        line(&mut out, 1, &format!("cancel-in-progress: {}", self.concurrency.cancel_in_progress));
        out.push('\n');

        if !self.env.is_empty() {
            line(&mut out, 0, "env:");
            for (key, value) in &self.env {
                line(&mut out, 1, &format!("{key}: {}", quote(value)));
            }
            out.push('\n');
        }

        line(&mut out, 0, "jobs:");
        for (index, job) in self.jobs.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            render_job(&mut out, job);
        }
        out
    }
}

fn render_job(out: &mut String, job: &Job) {
    line(out, 1, &format!("{}:", job.id));
    line(out, 2, &format!("name: {}", job.name));
    line(out, 2, &format!("runs-on: {}", job.runs_on));
    line(out, 2, "steps:");

    for step in &job.steps {
        line(out, 3, &format!("- name: {}", step.title()));
        match step {
            Step::Checkout => line(out, 4, &format!("uses: {CHECKOUT_ACTION}")),
            Step::InstallToolchain { toolchain, targets, components } => {
                line(out, 4, &format!("uses: {TOOLCHAIN_ACTION}"));
                line(out, 4, "with:");
                line(out, 5, &format!("toolchain: {toolchain}"));
                if !targets.is_empty() {
                    line(out, 5, &format!("targets: {}", targets.join(", ")));
                }
                if !components.is_empty() {
                    line(out, 5, &format!("components: {}", components.join(", ")));
                }
            },
            Step::InstallTool { crate_name, .. } => {
                line(out, 4, &format!("run: cargo install {crate_name} --locked"));
            },
            Step::RunTask { task, .. } => line(out, 4, &format!("run: cargo xtask {task}")),
        }
    }
}

/// Writes `text` indented by `level` steps of two spaces.
fn line(out: &mut String, level: usize, text: &str) {
    let _ = writeln!(out, "{:indent$}{text}", "", indent = level * 2);
}

fn list(out: &mut String, level: usize, key: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    line(out, level, &format!("{key}:"));
    for item in items {
        line(out, level + 1, &format!("- {}", quote(item)));
    }
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
