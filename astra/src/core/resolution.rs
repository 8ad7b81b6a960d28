//! Terminal-condition rules for a mission step.

use crate::core::state::MissionState;
use crate::core::telemetry::{CPU_TEMPERATURE, SystemStatus};

/// CPU temperature below which a recovering or operational system counts as
/// resolved. Fixed; independent of any per-scenario `max_cpu_temperature`.
pub const RESOLVED_CPU_TEMPERATURE: f64 = 80.0;

/// What the controller should do after recording a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepVerdict {
    Resolved,
    Critical,
    /// Constraints failed; engage the degraded-safe fallback and stop.
    ConstraintViolation,
    Continue,
}

/// `status ∈ {OPERATIONAL, RECOVERING}` and CPU below the fixed limit.
///
/// A missing CPU reading counts as `0`.
pub fn is_mission_resolved(state: &MissionState) -> bool {
    let telemetry = state.current();
    let status_ok = matches!(
        telemetry.status(),
        SystemStatus::Operational | SystemStatus::Recovering
    );
    status_ok && telemetry.number_or(CPU_TEMPERATURE, 0.0) < RESOLVED_CPU_TEMPERATURE
}

/// Evaluate terminal conditions in priority order.
pub fn classify_step(state: &MissionState, constraints_ok: bool) -> StepVerdict {
    if is_mission_resolved(state) {
        return StepVerdict::Resolved;
    }
    if state.current().status() == SystemStatus::Critical {
        return StepVerdict::Critical;
    }
    if !constraints_ok {
        return StepVerdict::ConstraintViolation;
    }
    StepVerdict::Continue
}
