//! Sequential batch runs over a scenario directory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{info, instrument, warn};

use crate::controller::{CancelToken, MissionController};
use crate::core::types::{MissionOutcome, MissionSummary};
use crate::io::mission_log::write_batch_summary;
use crate::io::oracle::DecisionOracle;
use crate::io::scenario::load_scenario;
use crate::mission::run_scenario;

/// A scenario that could not be run.
#[derive(Debug, Clone)]
pub struct SkippedScenario {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub summaries: Vec<MissionSummary>,
    pub skipped: Vec<SkippedScenario>,
    pub summary_path: PathBuf,
}

impl BatchReport {
    /// First non-success outcome in scenario order, if any mission ran and
    /// did not succeed.
    pub fn first_unsuccessful(&self) -> Option<MissionOutcome> {
        self.summaries
            .iter()
            .map(|summary| summary.outcome)
            .find(|outcome| *outcome != MissionOutcome::Success)
    }
}

/// Run each scenario in `paths` in order and write `batch_summary.json`.
///
/// Load failures and scenarios whose `scenario_id` was already exported in
/// this batch are recorded in [`BatchReport::skipped`] and do not stop the
/// batch. A fired cancel token stops before the next scenario.
#[instrument(skip_all, fields(scenarios = paths.len(), out = %output_dir.display()))]
pub fn run_batch<O>(
    paths: &[PathBuf],
    controller: &MissionController<O>,
    output_dir: &Path,
    cancel: &CancelToken,
) -> Result<BatchReport>
where
    O: DecisionOracle + Send + Sync + ?Sized + 'static,
{
    let mut summaries = Vec::new();
    let mut skipped = Vec::new();
    let mut exported: HashMap<String, PathBuf> = HashMap::new();

    for path in paths {
        if cancel.is_cancelled() {
            info!("batch cancelled");
            break;
        }
        let outcome = load_scenario(path)
            .map_err(anyhow::Error::from)
            .and_then(|scenario| {
                if let Some(first) = exported.get(&scenario.scenario_id) {
                    bail!(
                        "duplicate scenario_id {:?}: already exported from {}",
                        scenario.scenario_id,
                        first.display()
                    );
                }
                let run = run_scenario(&scenario, controller, output_dir, cancel)?;
                exported.insert(scenario.scenario_id, path.clone());
                Ok(run)
            });
        match outcome {
            Ok(run) => summaries.push(run.report.summary),
            Err(err) => {
                warn!(path = %path.display(), err = %format!("{err:#}"), "skipping scenario");
                skipped.push(SkippedScenario {
                    path: path.clone(),
                    error: format!("{err:#}"),
                });
            }
        }
    }

    let summary_path = write_batch_summary(output_dir, &summaries)?;
    info!(
        ran = summaries.len(),
        skipped = skipped.len(),
        "batch finished"
    );
    Ok(BatchReport {
        summaries,
        skipped,
        summary_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    use crate::controller::ControllerConfig;
    use crate::io::oracle::RuleOracle;
    use crate::io::scenario::discover_scenarios;
    use crate::test_support::write_scenario;
    use serde_json::json;

    fn controller() -> MissionController<RuleOracle> {
        MissionController::new(ControllerConfig::default(), Arc::new(RuleOracle))
    }

    #[test]
    fn bad_scenarios_are_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("scenarios");
        fs::create_dir_all(&dir).expect("mkdir");
        write_scenario(
            &dir,
            "a_thermal",
            &json!({
                "telemetry": {"status": "CRITICAL", "thermal": {"cpu_temperature": 95}},
                "constraints": {"max_cpu_temperature": 85}
            }),
        );
        fs::write(dir.join("b_broken.json"), "{ not json").expect("write");
        write_scenario(&dir, "c_no_status", &json!({"telemetry": {"battery_charge": 50}}));

        let out = temp.path().join("out");
        let paths = discover_scenarios(&dir).expect("discover");
        let report = run_batch(&paths, &controller(), &out, &CancelToken::new()).expect("batch");

        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].scenario, "a_thermal");
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.first_unsuccessful(), None);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report.summary_path).expect("read"))
                .expect("parse");
        assert_eq!(written.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn duplicate_scenario_ids_are_skipped() {
        let temp = tempfile::tempdir().expect("tempdir");
        let first = write_scenario(
            temp.path(),
            "a",
            &json!({"scenario_id": "same", "telemetry": {"status": "CRITICAL"}}),
        );
        let second = write_scenario(
            temp.path(),
            "b",
            &json!({"scenario_id": "same", "telemetry": {"status": "OPERATIONAL"}}),
        );
        // `c` takes its id from the file stem; `d` declares the same id.
        let stem = write_scenario(temp.path(), "c", &json!({"telemetry": {"status": "DEGRADED"}}));
        let declares_stem = write_scenario(
            temp.path(),
            "d",
            &json!({"scenario_id": "c", "telemetry": {"status": "DEGRADED"}}),
        );
        let out = temp.path().join("out");

        let report = run_batch(
            &[first, second.clone(), stem, declares_stem.clone()],
            &controller(),
            &out,
            &CancelToken::new(),
        )
        .expect("batch");

        let ids: Vec<&str> = report.summaries.iter().map(|s| s.scenario.as_str()).collect();
        assert_eq!(ids, vec!["same", "c"]);
        let skipped: Vec<&PathBuf> = report.skipped.iter().map(|s| &s.path).collect();
        assert_eq!(skipped, vec![&second, &declares_stem]);
        assert!(report.skipped[0].error.contains("duplicate scenario_id"));

        let dirs = fs::read_dir(&out)
            .expect("read out")
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .count();
        assert_eq!(dirs, report.summaries.len());
        let summary: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(out.join("same").join("summary.json")).expect("read"),
        )
        .expect("parse");
        assert_eq!(summary["outcome"], "FAILURE");
    }

    #[test]
    fn cancelled_batch_runs_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_scenario(temp.path(), "s", &json!({"telemetry": {"status": "DEGRADED"}}));
        let cancel = CancelToken::new();
        cancel.cancel();
        let report =
            run_batch(&[path], &controller(), &temp.path().join("out"), &cancel).expect("batch");
        assert!(report.summaries.is_empty());
        assert!(report.summary_path.is_file());
    }

    #[test]
    fn reports_first_unsuccessful_outcome() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ok = write_scenario(
            temp.path(),
            "ok",
            &json!({"telemetry": {"status": "OPERATIONAL", "thermal": {"cpu_temperature": 50}}}),
        );
        let drained = write_scenario(
            temp.path(),
            "drained",
            &json!({
                "telemetry": {"status": "LOW_POWER", "battery_charge": 12},
                "constraints": {"min_battery_charge": 15}
            }),
        );
        let report = run_batch(
            &[ok, drained],
            &controller(),
            &temp.path().join("out"),
            &CancelToken::new(),
        )
        .expect("batch");
        assert_eq!(report.first_unsuccessful(), Some(MissionOutcome::Failure));
    }
}
