//! Stage model and run outcomes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use remote_exec::RemoteChannel;

/// One ordered unit of orchestration work
///
/// A stage is a pure function of current remote state to a report entry: a
/// precondition probe decides whether its effect already holds, and the
/// action applies it when it does not. Successfully completed work is never
/// re-executed, but it is re-validated on every run.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stage name as it appears in the run log
    fn name(&self) -> &'static str;

    /// Precondition: is this stage's effect already in place?
    async fn is_satisfied(&self, host: &dyn RemoteChannel) -> Result<bool>;

    /// Apply the stage's effect, returning any non-fatal warnings
    async fn apply(&self, host: &dyn RemoteChannel) -> Result<Vec<String>>;
}

/// What happened to a single stage within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Precondition already held; nothing was executed
    Skipped,
    /// The action ran and succeeded
    Applied,
    /// The action or precondition probe failed; the run stops here
    Failed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StageStatus::Skipped => "skipped",
            StageStatus::Applied => "applied",
            StageStatus::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Report entry for one attempted stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name
    pub stage: String,
    /// Outcome of the attempt
    pub status: StageStatus,
    /// Error detail when the stage failed
    pub detail: Option<String>,
    /// Non-fatal warnings the stage surfaced
    pub warnings: Vec<String>,
}

/// Overall state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No stage dispatched yet
    Pending,
    /// Stages are executing
    Running,
    /// The verification stage completed; warnings do not change this
    Done,
    /// A stage failed; no stage after the failure point was attempted
    Failed,
}

/// Ordered log of what a run did
///
/// Produced incrementally by the sequencer and discarded at process exit;
/// the run's overall status is the status of its last attempted stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    /// Final state of the run
    pub state: RunState,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished, if it got that far
    pub finished_at: Option<DateTime<Utc>>,
    /// Per-stage reports in dispatch order
    pub stages: Vec<StageReport>,
}

impl RunOutcome {
    /// The report of the stage that failed the run, if any
    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stages
            .iter()
            .find(|r| r.status == StageStatus::Failed)
    }

    /// All warnings surfaced across the run, with their stage names
    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.stages.iter().flat_map(|report| {
            report
                .warnings
                .iter()
                .map(move |w| (report.stage.as_str(), w.as_str()))
        })
    }

    /// True when the run completed, warnings included
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Done
    }
}
