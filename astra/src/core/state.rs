//! Mission state: current and previous telemetry plus declared constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::telemetry::Telemetry;

/// Read-only scenario definition as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub scenario_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub telemetry: Telemetry,
    #[serde(default)]
    pub constraints: BTreeMap<String, f64>,
}

/// Mutable state for one mission run.
///
/// `previous` always holds `current` as it was immediately before the most
/// recently applied action, or the initial snapshot if nothing was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionState {
    scenario_id: String,
    current: Telemetry,
    previous: Telemetry,
    constraints: BTreeMap<String, f64>,
}

impl MissionState {
    pub fn from_scenario(scenario: &Scenario) -> Self {
        Self::new(
            scenario.scenario_id.clone(),
            scenario.telemetry.clone(),
            scenario.constraints.clone(),
        )
    }

    pub fn new(
        scenario_id: impl Into<String>,
        telemetry: Telemetry,
        constraints: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            scenario_id: scenario_id.into(),
            previous: telemetry.clone(),
            current: telemetry,
            constraints,
        }
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    /// Defensive copy of the current snapshot.
    pub fn snapshot(&self) -> Telemetry {
        self.current.clone()
    }

    pub fn current(&self) -> &Telemetry {
        &self.current
    }

    pub fn previous(&self) -> &Telemetry {
        &self.previous
    }

    pub fn constraints(&self) -> &BTreeMap<String, f64> {
        &self.constraints
    }

    pub fn constraint(&self, key: &str) -> Option<f64> {
        self.constraints.get(key).copied()
    }

    /// Capture `current` as `previous`. Must run before every handler.
    pub fn commit_before_mutation(&mut self) {
        self.previous = self.current.clone();
    }

    /// Mutable access for action handlers only.
    pub(crate) fn current_mut(&mut self) -> &mut Telemetry {
        &mut self.current
    }
}
