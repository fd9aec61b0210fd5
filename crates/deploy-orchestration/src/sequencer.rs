//! The stage sequencer
//!
//! Drives every other component strictly in order; no component calls
//! another except through the sequencer. Execution is single-threaded and
//! sequential by design: ordering correctness (capture mode before sensor
//! start) is a hard requirement, and there is no retry of a failed stage
//! within a run — re-invoking the whole orchestrator is safe because every
//! stage is idempotent.

use chrono::Utc;
use tracing::{error, info, warn};

use crate::fleet::Fleet;
use crate::stage::{RunOutcome, RunState, Stage, StageReport, StageStatus};
use crate::stages::standard_stages;
use crate::target::DeployConfig;
use crate::Result;
use remote_exec::RemoteChannel;

/// Executes an ordered list of stages with fail-fast semantics
pub struct Sequencer {
    stages: Vec<Box<dyn Stage>>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl Sequencer {
    /// Create a sequencer over an explicit stage list
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Create the canonical full-deployment sequencer for a run
    ///
    /// Fails without touching the host when the target is invalid or the
    /// fleet's ordering relations do not form the required chain.
    pub fn standard(config: &DeployConfig, fleet: &Fleet) -> Result<Self> {
        Ok(Self::new(standard_stages(config, fleet)?))
    }

    /// Names of the stages in dispatch order
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run all stages in order against the host
    ///
    /// The first stage failure is terminal: no later stage is attempted and
    /// the outcome's state is [`RunState::Failed`]. Warnings surfaced by a
    /// stage (verification) are recorded without affecting the state.
    pub async fn run(&self, host: &dyn RemoteChannel) -> RunOutcome {
        let mut outcome = RunOutcome {
            state: RunState::Pending,
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::with_capacity(self.stages.len()),
        };

        for stage in &self.stages {
            outcome.state = RunState::Running;
            let name = stage.name();
            info!(stage = name, "stage starting");

            let report = match stage.is_satisfied(host).await {
                Ok(true) => {
                    info!(stage = name, "already satisfied");
                    StageReport {
                        stage: name.to_string(),
                        status: StageStatus::Skipped,
                        detail: None,
                        warnings: vec![],
                    }
                }
                Ok(false) => match stage.apply(host).await {
                    Ok(warnings) => {
                        info!(stage = name, "applied");
                        for warning in &warnings {
                            warn!(stage = name, "{}", warning);
                        }
                        StageReport {
                            stage: name.to_string(),
                            status: StageStatus::Applied,
                            detail: None,
                            warnings,
                        }
                    }
                    Err(e) => failure_report(name, &e),
                },
                Err(e) => failure_report(name, &e),
            };

            let failed = report.status == StageStatus::Failed;
            outcome.stages.push(report);
            if failed {
                outcome.state = RunState::Failed;
                break;
            }
        }

        if outcome.state != RunState::Failed {
            outcome.state = RunState::Done;
        }
        outcome.finished_at = Some(Utc::now());
        outcome
    }
}

fn failure_report(name: &str, error: &crate::Error) -> StageReport {
    error!(stage = name, "stage failed: {}", error);
    StageReport {
        stage: name.to_string(),
        status: StageStatus::Failed,
        detail: Some(error.to_string()),
        warnings: vec![],
    }
}
