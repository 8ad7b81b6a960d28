//! Decision oracle abstraction.
//!
//! The [`DecisionOracle`] trait decouples the mission controller from the
//! policy that picks actions. [`RuleOracle`] is a fixed rule cascade;
//! [`CommandOracle`] hands a rendered prompt to an external command (for
//! example a language-model wrapper) and parses its JSON answer. Tests use
//! scripted oracles that return predetermined decisions.

use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::state::MissionState;
use crate::core::telemetry::{CPU_TEMPERATURE, POWER_OUTPUT};
use crate::core::types::{Action, Decision};
use crate::io::process::run_command_with_timeout;
use crate::io::prompt::PromptEngine;

/// Non-fatal oracle failures. The controller degrades each to `NO_ACTION`.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("decision oracle timed out after {0:?}")]
    Timeout(Duration),
    #[error("decision oracle failed: {0}")]
    Failed(String),
    #[error("decision oracle returned malformed output: {0}")]
    Malformed(String),
}

/// Policy that chooses the next action for a mission.
///
/// Implementations receive a shared borrow and cannot mutate mission state.
pub trait DecisionOracle {
    fn decide(&self, state: &MissionState) -> Result<Decision>;
}

impl<F> DecisionOracle for F
where
    F: Fn(&MissionState) -> Result<Decision>,
{
    fn decide(&self, state: &MissionState) -> Result<Decision> {
        self(state)
    }
}

/// Thermal first, then power, else hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleOracle;

impl RuleOracle {
    const CPU_LIMIT_DEFAULT: f64 = 999.0;
    const POWER_DEFAULT: f64 = 100.0;
    const POWER_MIN_DEFAULT: f64 = 0.0;
}

impl DecisionOracle for RuleOracle {
    fn decide(&self, state: &MissionState) -> Result<Decision> {
        let telemetry = state.current();

        let cpu = telemetry.number_or(CPU_TEMPERATURE, 0.0);
        let cpu_limit = state
            .constraint("max_cpu_temperature")
            .unwrap_or(Self::CPU_LIMIT_DEFAULT);
        if cpu > cpu_limit {
            return Ok(Decision::new(
                Action::ActivateCooling,
                "CPU temperature exceeds safe thermal envelope",
                0.91,
            ));
        }

        let power = telemetry.number_or(POWER_OUTPUT, Self::POWER_DEFAULT);
        let power_min = state
            .constraint("min_power_output")
            .unwrap_or(Self::POWER_MIN_DEFAULT);
        if power < power_min {
            return Ok(Decision::new(
                Action::RedeployPanels,
                "Power output below mission requirement",
                0.88,
            ));
        }

        Ok(Decision::new(
            Action::NoAction,
            "System operating within nominal parameters",
            0.99,
        ))
    }
}

/// Oracle that spawns an external command per decision.
///
/// The rendered prompt goes to stdin; stdout must contain a JSON object with
/// `action`, `reason` and `confidence`, optionally wrapped in a Markdown code
/// fence.
pub struct CommandOracle {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
    prompts: PromptEngine,
}

impl CommandOracle {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Result<Self> {
        if command.is_empty() {
            return Err(OracleError::Failed("empty oracle command".to_string()).into());
        }
        Ok(Self {
            command,
            timeout,
            output_limit_bytes,
            prompts: PromptEngine::new()?,
        })
    }
}

impl DecisionOracle for CommandOracle {
    #[instrument(skip_all, fields(program = %self.command[0], timeout_secs = self.timeout.as_secs()))]
    fn decide(&self, state: &MissionState) -> Result<Decision> {
        let prompt = self.prompts.render_decision(state)?;

        let mut cmd = Command::new(&self.command[0]);
        cmd.args(&self.command[1..]);
        info!(scenario = state.scenario_id(), "requesting decision");
        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
        )
        .context("run oracle command")?;

        if output.timed_out {
            return Err(OracleError::Timeout(self.timeout).into());
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle command failed");
            return Err(OracleError::Failed(format!(
                "exit status {:?}: {}",
                output.status.code(),
                output.stderr_lossy().trim()
            ))
            .into());
        }

        let decision = parse_decision(&output.stdout_lossy())?;
        debug!(action = decision.action.as_str(), confidence = decision.confidence, "parsed decision");
        Ok(decision)
    }
}

/// Parse oracle text into a [`Decision`], stripping Markdown code fences.
pub fn parse_decision(raw: &str) -> Result<Decision, OracleError> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|err| OracleError::Malformed(format!("parse json: {err}")))?;
    let missing: Vec<&str> = ["action", "reason", "confidence"]
        .into_iter()
        .filter(|key| value.get(key).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(OracleError::Malformed(format!(
            "missing keys: {}",
            missing.join(", ")
        )));
    }
    serde_json::from_value(value).map_err(|err| OracleError::Malformed(err.to_string()))
}

fn strip_code_fences(raw: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[A-Za-z]*").unwrap());
    FENCE_RE.replace_all(raw, "").trim().to_string()
}
