//! Concurrency groups and run supersession.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

pub const WORKFLOW_PLACEHOLDER: &str = "${{ github.workflow }}";
pub const REF_PLACEHOLDER: &str = "${{ github.ref }}";

/// The `concurrency:` section of the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Concurrency {
    /// Group template; may contain the workflow and ref placeholders.
    pub group: String,
    pub cancel_in_progress: bool,
}

impl Concurrency {
    /// Group keyed by workflow and ref.
    #[must_use]
    pub fn per_ref(cancel_in_progress: bool) -> Self {
        Self { group: format!("{WORKFLOW_PLACEHOLDER}-{REF_PLACEHOLDER}"), cancel_in_progress }
    }

    /// Substitutes the placeholders in the group template.
    #[must_use]
    pub fn resolve(&self, workflow: &str, git_ref: &str) -> String {
        self.group.replace(WORKFLOW_PLACEHOLDER, workflow).replace(REF_PLACEHOLDER, git_ref)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    InProgress,
    Cancelled,
    Completed,
}

/// Returned by [`RunScheduler::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub id: RunId,
    pub state: RunState,
    /// Runs of the same group cancelled by this submission.
    pub cancelled: Vec<RunId>,
}

#[derive(Debug, Default)]
struct GroupSlot {
    active: Option<RunId>,
    pending: Option<RunId>,
}

#[derive(Debug)]
struct RunRecord {
    group: String,
    state: RunState,
}

/// Tracks workflow runs per concurrency group.
///
/// At most one run per group is in progress. With `cancel_in_progress` a new run supersedes
/// the active one; otherwise it waits, and only the most recent waiting run is kept.
#[derive(Debug, Default)]
pub struct RunScheduler {
    next_id: u64,
    runs: BTreeMap<RunId, RunRecord>,
    groups: HashMap<String, GroupSlot>,
}

impl RunScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, group: &str, cancel_in_progress: bool) -> Admission {
        self.next_id += 1;
        let id = RunId(self.next_id);
        let slot = self.groups.entry(group.to_owned()).or_default();
        let mut cancelled = Vec::new();

        if let Some(previous) = slot.pending.take() {
            cancelled.push(previous);
        }

        let state = match slot.active {
            Some(active) if cancel_in_progress => {
                cancelled.push(active);
                slot.active = Some(id);
                RunState::InProgress
            },
            Some(_) => {
                slot.pending = Some(id);
                RunState::Pending
            },
            None => {
                slot.active = Some(id);
                RunState::InProgress
            },
        };

        for run in &cancelled {
            if let Some(record) = self.runs.get_mut(run) {
                record.state = RunState::Cancelled;
            }
            debug!(group, cancelled = %run, superseded_by = %id, "Cancelled run");
        }
        self.runs.insert(id, RunRecord { group: group.to_owned(), state });

        Admission { id, state, cancelled }
    }

    /// Marks an in-progress run as finished and starts the pending run of its group.
    ///
    /// Returns the promoted run, if any. Completing a run that is not in progress is a no-op.
    pub fn complete(&mut self, id: RunId) -> Option<RunId> {
        let record = self.runs.get_mut(&id)?;
        if record.state != RunState::InProgress {
            return None;
        }
        record.state = RunState::Completed;
        let group = record.group.clone();

        let slot = self.groups.get_mut(&group)?;
        slot.active = slot.pending.take();
        let promoted = slot.active?;
        if let Some(next) = self.runs.get_mut(&promoted) {
            next.state = RunState::InProgress;
        }
        Some(promoted)
    }

    #[must_use]
    pub fn state(&self, id: RunId) -> Option<RunState> {
        self.runs.get(&id).map(|r| r.state)
    }

    /// Runs currently executing, across all groups.
    pub fn in_progress(&self) -> impl Iterator<Item = RunId> + '_ {
        self.runs.iter().filter(|(_, r)| r.state == RunState::InProgress).map(|(id, _)| *id)
    }
}
