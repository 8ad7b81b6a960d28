//! Mission controller: the bounded sense → decide → act → verify loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info, instrument, warn};

use crate::core::actions;
use crate::core::constraints;
use crate::core::resolution::{StepVerdict, classify_step};
use crate::core::state::MissionState;
use crate::core::telemetry::{CPU_TEMPERATURE, POWER_OUTPUT};
use crate::core::types::{
    Action, ActionId, Decision, MissionOutcome, MissionPhase, MissionSummary, StepRecord,
};
use crate::io::config::MissionConfig;
use crate::io::oracle::{DecisionOracle, OracleError};

/// Loop bounds handed to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Maximum loop iterations before the mission times out.
    pub max_steps: u32,
    /// Budget for one oracle decision.
    pub decision_timeout: Duration,
    /// Pause between non-terminal steps.
    pub step_delay: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            decision_timeout: Duration::from_secs(30),
            step_delay: Duration::ZERO,
        }
    }
}

impl From<&MissionConfig> for ControllerConfig {
    fn from(cfg: &MissionConfig) -> Self {
        Self {
            max_steps: cfg.max_steps,
            decision_timeout: cfg.decision_timeout(),
            step_delay: cfg.step_delay(),
        }
    }
}

/// Cooperative stop signal, checked before every step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Step log plus summary for one mission run.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub records: Vec<StepRecord>,
    pub summary: MissionSummary,
}

impl MissionReport {
    pub fn outcome(&self) -> MissionOutcome {
        self.summary.outcome
    }
}

/// Drives one mission at a time against a decision oracle.
pub struct MissionController<O: ?Sized> {
    config: ControllerConfig,
    oracle: Arc<O>,
}

impl<O> MissionController<O>
where
    O: DecisionOracle + Send + Sync + ?Sized + 'static,
{
    pub fn new(config: ControllerConfig, oracle: Arc<O>) -> Self {
        Self { config, oracle }
    }

    pub fn run(&self, state: &mut MissionState, cancel: &CancelToken) -> MissionReport {
        self.run_with(state, cancel, |_, _| {})
    }

    /// Run the loop until a terminal condition, calling `on_step` with each
    /// recorded step and the state right after its action was applied.
    ///
    /// Never fails: oracle errors degrade to `NO_ACTION`, constraint
    /// violations end the mission through the degraded-safe fallback.
    #[instrument(skip_all, fields(scenario = state.scenario_id(), max_steps = self.config.max_steps))]
    pub fn run_with<F: FnMut(&StepRecord, &MissionState)>(
        &self,
        state: &mut MissionState,
        cancel: &CancelToken,
        mut on_step: F,
    ) -> MissionReport {
        info!(status = %state.current().status(), "mission started");
        let mut records = Vec::new();
        let mut phase = MissionPhase::Running;
        let mut safe_mode_engaged = false;
        let mut clock = StepClock::default();

        for step in 1..=self.config.max_steps {
            if cancel.is_cancelled() {
                info!(step, "mission cancelled");
                phase = MissionPhase::Cancelled;
                break;
            }

            let sensed = state.snapshot();
            debug!(step, status = %sensed.status(), "sensed telemetry");

            let decision = self.decide(state);
            let action = ActionId::parse(&decision.action);
            if let ActionId::Unknown(raw) = &action {
                warn!(step, action = raw.as_str(), "oracle chose an unknown action");
            }
            actions::apply(state, &action);

            let constraints_ok = constraints::check(state);
            let record = StepRecord {
                step,
                action: decision.action.clone(),
                reason: decision.reason.clone(),
                confidence: decision.clamped_confidence(),
                constraints_ok,
                system_status: state.current().status(),
                timestamp: clock.next(),
            };
            info!(
                step,
                action = record.action.as_str(),
                confidence = record.confidence,
                constraints_ok,
                status = %record.system_status,
                "step complete"
            );
            on_step(&record, &*state);
            records.push(record);

            match classify_step(state, constraints_ok) {
                StepVerdict::Resolved => phase = MissionPhase::Resolved,
                StepVerdict::Critical => phase = MissionPhase::Failed,
                StepVerdict::ConstraintViolation => {
                    warn!(
                        step,
                        violations = ?constraints::violations(state),
                        "constraints violated, entering degraded safe mode"
                    );
                    actions::apply(state, &Action::EnterDegradedMode.into());
                    safe_mode_engaged = true;
                    phase = MissionPhase::Failed;
                }
                StepVerdict::Continue => {}
            }
            if phase.is_terminal() {
                break;
            }
            if !self.config.step_delay.is_zero() && step < self.config.max_steps {
                thread::sleep(self.config.step_delay);
            }
        }

        if phase == MissionPhase::Running {
            phase = MissionPhase::TimedOut;
        }
        let outcome = phase.outcome().unwrap_or(MissionOutcome::Timeout);
        let telemetry = state.current();
        let summary = MissionSummary {
            scenario: state.scenario_id().to_string(),
            total_steps: u32::try_from(records.len()).unwrap_or(u32::MAX),
            final_status: telemetry.status(),
            final_cpu_temperature: telemetry.number(CPU_TEMPERATURE),
            final_power_output: telemetry.number(POWER_OUTPUT),
            outcome,
            safe_mode_engaged,
        };
        info!(
            outcome = %summary.outcome,
            steps = summary.total_steps,
            final_status = %summary.final_status,
            "mission finished"
        );
        MissionReport { records, summary }
    }

    /// Ask the oracle on a worker thread and wait at most `decision_timeout`.
    ///
    /// The oracle sees a copy of the state; a late answer is discarded.
    fn decide(&self, state: &MissionState) -> Decision {
        let oracle = Arc::clone(&self.oracle);
        let view = state.clone();
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name("astra-oracle".to_string())
            .spawn(move || {
                // The receiver is gone once the controller stopped waiting.
                let _ = tx.send(oracle.decide(&view));
            });
        if let Err(err) = spawned {
            warn!(err = %err, "failed to spawn oracle worker");
            return Decision::fallback(format!("decision oracle error: spawn worker: {err}"));
        }

        match rx.recv_timeout(self.config.decision_timeout) {
            Ok(Ok(decision)) => decision,
            Ok(Err(err)) => {
                warn!(err = %format!("{err:#}"), "decision oracle failed");
                Decision::fallback(format!("decision oracle error: {err:#}"))
            }
            Err(RecvTimeoutError::Timeout) => {
                let err = OracleError::Timeout(self.config.decision_timeout);
                warn!(err = %err, "decision oracle timed out");
                Decision::fallback(err.to_string())
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("decision oracle worker exited without a decision");
                Decision::fallback("decision oracle error: worker exited without a decision")
            }
        }
    }
}

/// Millisecond UTC timestamps, strictly increasing per mission.
#[derive(Debug, Default)]
struct StepClock {
    last_millis: Option<i64>,
}

impl StepClock {
    fn next(&mut self) -> String {
        let now = Utc::now().timestamp_millis();
        let millis = match self.last_millis {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_millis = Some(millis);
        DateTime::from_timestamp_millis(millis)
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
