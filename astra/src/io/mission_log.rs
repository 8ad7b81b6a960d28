//! Mission export helpers for `<output_dir>/<scenario_id>/`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::core::types::{MissionSummary, StepRecord};

#[derive(Debug, Clone)]
pub struct MissionPaths {
    pub dir: PathBuf,
    pub log_path: PathBuf,
    pub summary_path: PathBuf,
}

impl MissionPaths {
    pub fn new(output_dir: &Path, scenario_id: &str) -> Self {
        let dir = output_dir.join(scenario_id);
        Self {
            log_path: dir.join("mission_log.json"),
            summary_path: dir.join("summary.json"),
            dir,
        }
    }
}

pub struct MissionWriteRequest<'a> {
    pub output_dir: &'a Path,
    pub scenario_id: &'a str,
    pub records: &'a [StepRecord],
    pub summary: &'a MissionSummary,
}

/// Write the step log and summary for one mission run.
pub fn write_mission(request: &MissionWriteRequest<'_>) -> Result<MissionPaths> {
    let paths = MissionPaths::new(request.output_dir, request.scenario_id);
    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create mission dir {}", paths.dir.display()))?;

    write_json(&paths.log_path, &request.records)?;
    write_json(&paths.summary_path, request.summary)?;
    debug!(dir = %paths.dir.display(), steps = request.records.len(), "mission exported");

    Ok(paths)
}

/// Write one summary per mission into `<output_dir>/batch_summary.json`.
pub fn write_batch_summary(output_dir: &Path, summaries: &[MissionSummary]) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir {}", output_dir.display()))?;
    let path = output_dir.join("batch_summary.json");
    write_json(&path, &summaries)?;
    Ok(path)
}

/// Pretty-printed JSON with trailing newline.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value).context("serialize json")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telemetry::SystemStatus;
    use crate::core::types::MissionOutcome;

    fn summary() -> MissionSummary {
        MissionSummary {
            scenario: "thermal_overheat".to_string(),
            total_steps: 1,
            final_status: SystemStatus::Recovering,
            final_cpu_temperature: Some(70.0),
            final_power_output: Some(120.0),
            outcome: MissionOutcome::Success,
            safe_mode_engaged: false,
        }
    }

    #[test]
    fn mission_paths_are_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = MissionPaths::new(temp.path(), "solar_failure");
        assert!(paths.dir.ends_with("solar_failure"));
        assert!(paths.log_path.ends_with("solar_failure/mission_log.json"));
        assert!(paths.summary_path.ends_with("solar_failure/summary.json"));
    }

    #[test]
    fn writes_log_and_summary() {
        let temp = tempfile::tempdir().expect("tempdir");
        let records = vec![StepRecord {
            step: 1,
            action: "ACTIVATE_COOLING".to_string(),
            reason: "hot".to_string(),
            confidence: 0.91,
            constraints_ok: true,
            system_status: SystemStatus::Recovering,
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
        }];
        let summary = summary();

        let paths = write_mission(&MissionWriteRequest {
            output_dir: temp.path(),
            scenario_id: "thermal_overheat",
            records: &records,
            summary: &summary,
        })
        .expect("write");

        let log: Vec<StepRecord> =
            serde_json::from_str(&fs::read_to_string(&paths.log_path).expect("read log"))
                .expect("parse log");
        assert_eq!(log, records);

        let raw = fs::read_to_string(&paths.summary_path).expect("read summary");
        assert!(raw.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&raw).expect("parse summary");
        assert_eq!(value["outcome"], "SUCCESS");
        assert_eq!(value["final_status"], "RECOVERING");
        assert_eq!(value["total_steps"], 1);
    }

    #[test]
    fn batch_summary_is_an_array() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_batch_summary(temp.path(), &[summary(), summary()]).expect("write");
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse");
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
