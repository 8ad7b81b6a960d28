//! Orchestration for a single `astra run`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{info, instrument};

use crate::controller::{CancelToken, MissionController, MissionReport};
use crate::core::state::{MissionState, Scenario};
use crate::io::config::{MissionConfig, OracleKind};
use crate::io::mission_log::{MissionPaths, MissionWriteRequest, write_mission};
use crate::io::oracle::{CommandOracle, DecisionOracle, RuleOracle};
use crate::io::scenario::load_scenario;

/// Oracle selected at runtime from config or CLI.
pub type SharedOracle = Arc<dyn DecisionOracle + Send + Sync>;

/// Result of one exported mission.
#[derive(Debug, Clone)]
pub struct MissionRun {
    pub report: MissionReport,
    pub paths: MissionPaths,
}

/// Build the oracle named by `cfg.oracle`.
pub fn build_oracle(cfg: &MissionConfig) -> Result<SharedOracle> {
    match cfg.oracle.kind {
        OracleKind::Rules => Ok(Arc::new(RuleOracle)),
        OracleKind::Command => {
            if cfg.oracle.command.is_empty() {
                bail!("oracle.kind = \"command\" requires oracle.command");
            }
            let oracle = CommandOracle::new(
                cfg.oracle.command.clone(),
                cfg.decision_timeout(),
                cfg.oracle_output_limit_bytes,
            )?;
            Ok(Arc::new(oracle))
        }
    }
}

/// Load `scenario_path`, run it to a terminal outcome and export the results.
///
/// Scenario failures surface as [`crate::io::scenario::ScenarioError`] inside
/// the returned error; no mission directory is created in that case.
#[instrument(skip_all, fields(scenario = %scenario_path.display()))]
pub fn run_mission<O>(
    scenario_path: &Path,
    controller: &MissionController<O>,
    output_dir: &Path,
    cancel: &CancelToken,
) -> Result<MissionRun>
where
    O: DecisionOracle + Send + Sync + ?Sized + 'static,
{
    let scenario = load_scenario(scenario_path)?;
    run_scenario(&scenario, controller, output_dir, cancel)
}

/// Run an already loaded scenario and export to `<output_dir>/<scenario_id>/`.
pub fn run_scenario<O>(
    scenario: &Scenario,
    controller: &MissionController<O>,
    output_dir: &Path,
    cancel: &CancelToken,
) -> Result<MissionRun>
where
    O: DecisionOracle + Send + Sync + ?Sized + 'static,
{
    let mut state = MissionState::from_scenario(scenario);
    let report = controller.run(&mut state, cancel);

    let paths = write_mission(&MissionWriteRequest {
        output_dir,
        scenario_id: state.scenario_id(),
        records: &report.records,
        summary: &report.summary,
    })?;
    info!(
        outcome = %report.summary.outcome,
        log = %paths.log_path.display(),
        "mission exported"
    );
    Ok(MissionRun { report, paths })
}
