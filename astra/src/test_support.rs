//! Test-only helpers: mission state builders, scripted oracles, scenario files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use serde_json::Value;
use tempfile::TempDir;

use crate::core::state::MissionState;
use crate::core::telemetry::Telemetry;
use crate::core::types::{Action, Decision};
use crate::io::oracle::{DecisionOracle, OracleError};

/// Build a mission state from JSON telemetry and constraint objects.
///
/// Panics on malformed input; intended for fixtures only.
pub fn state_from_json(telemetry: Value, constraints: Value) -> MissionState {
    let telemetry: Telemetry = serde_json::from_value(telemetry).expect("telemetry object");
    let constraints: BTreeMap<String, f64> =
        serde_json::from_value(constraints).expect("constraints object");
    MissionState::new("test", telemetry, constraints)
}

/// Write `<dir>/<name>.json` and return its path.
pub fn write_scenario(dir: &Path, name: &str, doc: &Value) -> PathBuf {
    let path = dir.join(format!("{name}.json"));
    let raw = serde_json::to_string_pretty(doc).expect("serialize scenario");
    fs::write(&path, raw).expect("write scenario");
    path
}

/// Temporary workspace with `scenarios/` and `out/` directories.
pub struct MissionFixture {
    pub temp: TempDir,
    pub scenarios: PathBuf,
    pub out: PathBuf,
}

impl MissionFixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let scenarios = temp.path().join("scenarios");
        fs::create_dir_all(&scenarios).expect("create scenarios dir");
        let out = temp.path().join("out");
        Self {
            temp,
            scenarios,
            out,
        }
    }

    pub fn scenario(&self, name: &str, doc: &Value) -> PathBuf {
        write_scenario(&self.scenarios, name, doc)
    }

    /// Copy a file from the repository's `scenarios/` directory.
    pub fn sample(&self, name: &str) -> PathBuf {
        let source = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("scenarios")
            .join(format!("{name}.json"));
        let dest = self.scenarios.join(format!("{name}.json"));
        fs::copy(&source, &dest).expect("copy sample scenario");
        dest
    }
}

impl Default for MissionFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns scripted decisions in order, repeating the last one.
pub struct ScriptedOracle {
    decisions: Vec<Decision>,
    next: Mutex<usize>,
}

impl ScriptedOracle {
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self {
            decisions,
            next: Mutex::new(0),
        }
    }

    pub fn repeat(action: Action) -> Self {
        Self::new(vec![Decision::new(action, "scripted", 0.9)])
    }

    /// Number of decisions handed out so far.
    pub fn calls(&self) -> usize {
        *self.next.lock().expect("lock")
    }
}

impl DecisionOracle for ScriptedOracle {
    fn decide(&self, _state: &MissionState) -> Result<Decision> {
        let mut next = self.next.lock().map_err(|_| anyhow!("scripted oracle poisoned"))?;
        let index = (*next).min(self.decisions.len().saturating_sub(1));
        *next += 1;
        self.decisions
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("scripted oracle has no decisions"))
    }
}

/// Always fails.
pub struct FailingOracle;

impl DecisionOracle for FailingOracle {
    fn decide(&self, _state: &MissionState) -> Result<Decision> {
        Err(OracleError::Failed("scripted failure".to_string()).into())
    }
}

/// Sleeps before answering.
pub struct SlowOracle {
    delay: Duration,
    action: Action,
}

impl SlowOracle {
    pub fn new(delay: Duration, action: Action) -> Self {
        Self { delay, action }
    }
}

impl DecisionOracle for SlowOracle {
    fn decide(&self, _state: &MissionState) -> Result<Decision> {
        thread::sleep(self.delay);
        Ok(Decision::new(self.action, "slow", 0.5))
    }
}
