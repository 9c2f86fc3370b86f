use super::pattern::matches_any;
use crate::settings::CiSettings;
use std::fmt;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A repository event that may start the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Push { git_ref: String },
    PullRequest { git_ref: String },
}

impl Event {
    #[must_use]
    pub fn git_ref(&self) -> &str {
        match self {
            Self::Push { git_ref } | Self::PullRequest { git_ref } => git_ref,
        }
    }

    /// Branch name for `refs/heads/...` refs.
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        self.git_ref().strip_prefix(BRANCH_REF_PREFIX)
    }
}

/// Why the workflow runs or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Run,
    /// Push to a branch that is not listed.
    SkipBranch,
    /// Event kind is not enabled.
    SkipEvent,
    /// Every changed path is ignored.
    SkipIgnoredPaths,
}

impl TriggerDecision {
    #[must_use]
    pub const fn should_run(self) -> bool {
        matches!(self, Self::Run)
    }
}

impl fmt::Display for TriggerDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Run => "run",
            Self::SkipBranch => "skip (branch not watched)",
            Self::SkipEvent => "skip (event not enabled)",
            Self::SkipIgnoredPaths => "skip (only ignored paths changed)",
        })
    }
}

/// The `on:` section of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triggers {
    /// Branch patterns for `push`. Empty disables push triggering.
    pub push_branches: Vec<String>,
    pub pull_request: bool,
    /// Shared by both events.
    pub paths_ignore: Vec<String>,
}

impl Triggers {
    #[must_use]
    pub fn from_settings(ci: &CiSettings) -> Self {
        Self {
            push_branches: ci.branches.clone(),
            pull_request: ci.pull_request,
            paths_ignore: ci.paths_ignore.clone(),
        }
    }

    /// Decides whether `event` with the given changed paths starts a run.
    ///
    /// An empty change set is treated as unknown and never filtered by `paths_ignore`.
    pub fn evaluate<S: AsRef<str>>(&self, event: &Event, changed_paths: &[S]) -> TriggerDecision {
        match event {
            Event::Push { .. } => {
                if self.push_branches.is_empty() {
                    return TriggerDecision::SkipEvent;
                }
                let watched =
                    event.branch().is_some_and(|b| matches_any(&self.push_branches, b));
                if !watched {
                    return TriggerDecision::SkipBranch;
                }
            },
            Event::PullRequest { .. } => {
                if !self.pull_request {
                    return TriggerDecision::SkipEvent;
                }
            },
        }

        let only_ignored = !changed_paths.is_empty()
            && changed_paths.iter().all(|p| matches_any(&self.paths_ignore, p.as_ref()));
        if only_ignored {
            return TriggerDecision::SkipIgnoredPaths;
        }

        TriggerDecision::Run
    }
}
