//! Shared deterministic types for the mission core.
//!
//! These types define stable contracts between core components and the
//! exported artifacts. They must not depend on external state or I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::telemetry::SystemStatus;

/// Corrective command from the fixed action catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ActivateCooling,
    RedeployPanels,
    PowerSaveMode,
    EnterDegradedMode,
    NoAction,
}

impl Action {
    /// Every catalog entry, in declaration order.
    pub const ALL: [Action; 5] = [
        Action::ActivateCooling,
        Action::RedeployPanels,
        Action::PowerSaveMode,
        Action::EnterDegradedMode,
        Action::NoAction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ActivateCooling => "ACTIVATE_COOLING",
            Action::RedeployPanels => "REDEPLOY_PANELS",
            Action::PowerSaveMode => "POWER_SAVE_MODE",
            Action::EnterDegradedMode => "ENTER_DEGRADED_MODE",
            Action::NoAction => "NO_ACTION",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("unknown action '{s}'"))
    }
}

/// Action identifier as chosen by an oracle.
///
/// Parsing never fails: identifiers outside the catalog are kept verbatim so
/// they can be recorded, and they do not touch telemetry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionId {
    Known(Action),
    Unknown(String),
}

impl ActionId {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().parse::<Action>() {
            Ok(action) => ActionId::Known(action),
            Err(_) => ActionId::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionId::Known(action) => action.as_str(),
            ActionId::Unknown(raw) => raw.as_str(),
        }
    }
}

impl From<Action> for ActionId {
    fn from(action: Action) -> Self {
        ActionId::Known(action)
    }
}

/// Structured output of a decision oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: String,
    pub reason: String,
    pub confidence: f64,
}

impl Decision {
    pub fn new(action: Action, reason: impl Into<String>, confidence: f64) -> Self {
        Self {
            action: action.as_str().to_string(),
            reason: reason.into(),
            confidence,
        }
    }

    /// Stand-in used when the oracle fails or times out.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self::new(Action::NoAction, reason, 0.0)
    }

    /// Confidence clamped into `[0, 1]`; NaN reads as zero.
    pub fn clamped_confidence(&self) -> f64 {
        if self.confidence.is_nan() {
            return 0.0;
        }
        self.confidence.clamp(0.0, 1.0)
    }
}

/// Audit entry for one executed loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step index (1-indexed).
    pub step: u32,
    /// Action identifier as returned by the oracle (verbatim if unknown).
    pub action: String,
    pub reason: String,
    pub confidence: f64,
    /// Result of the constraint check after the action was applied.
    pub constraints_ok: bool,
    /// Status immediately after the action.
    pub system_status: SystemStatus,
    /// RFC 3339 UTC, strictly increasing within one mission.
    pub timestamp: String,
}

/// Terminal classification of a mission run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionOutcome {
    Success,
    Failure,
    Timeout,
    /// The run was stopped through its cancel token.
    Cancelled,
}

impl MissionOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionOutcome::Success => "SUCCESS",
            MissionOutcome::Failure => "FAILURE",
            MissionOutcome::Timeout => "TIMEOUT",
            MissionOutcome::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for MissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller state machine. Every state except `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissionPhase {
    Running,
    Resolved,
    Failed,
    TimedOut,
    Cancelled,
}

impl MissionPhase {
    pub fn is_terminal(self) -> bool {
        self != MissionPhase::Running
    }

    /// Outcome for a terminal phase; `None` while still running.
    pub fn outcome(self) -> Option<MissionOutcome> {
        match self {
            MissionPhase::Running => None,
            MissionPhase::Resolved => Some(MissionOutcome::Success),
            MissionPhase::Failed => Some(MissionOutcome::Failure),
            MissionPhase::TimedOut => Some(MissionOutcome::Timeout),
            MissionPhase::Cancelled => Some(MissionOutcome::Cancelled),
        }
    }
}

/// One record per mission run, exported alongside the step log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSummary {
    pub scenario: String,
    pub total_steps: u32,
    pub final_status: SystemStatus,
    pub final_cpu_temperature: Option<f64>,
    pub final_power_output: Option<f64>,
    pub outcome: MissionOutcome,
    /// True when the degraded-safe fallback ran after a constraint violation.
    pub safe_mode_engaged: bool,
}
