//! Constraint validator.
//!
//! Each known constraint key has a fixed reading and comparator. A key that
//! is not declared never fails; a declared key with no rule is ignored.

use tracing::debug;

use crate::core::state::MissionState;
use crate::core::telemetry::{
    BATTERY_CHARGE, CPU_TEMPERATURE, GPU_TEMPERATURE, PANEL_TEMPERATURE, POWER_OUTPUT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    /// Fails when the reading is above the threshold.
    Max,
    /// Fails when the reading is below the threshold.
    Min,
}

struct ConstraintRule {
    key: &'static str,
    reading: &'static str,
    bound: Bound,
}

const RULES: &[ConstraintRule] = &[
    ConstraintRule {
        key: "max_cpu_temperature",
        reading: CPU_TEMPERATURE,
        bound: Bound::Max,
    },
    ConstraintRule {
        key: "max_gpu_temperature",
        reading: GPU_TEMPERATURE,
        bound: Bound::Max,
    },
    ConstraintRule {
        key: "max_panel_temperature",
        reading: PANEL_TEMPERATURE,
        bound: Bound::Max,
    },
    ConstraintRule {
        key: "min_battery_charge",
        reading: BATTERY_CHARGE,
        bound: Bound::Min,
    },
    ConstraintRule {
        key: "min_power_output",
        reading: POWER_OUTPUT,
        bound: Bound::Min,
    },
];

/// True if every declared constraint with a known rule is satisfied.
pub fn check(state: &MissionState) -> bool {
    violations(state).is_empty()
}

/// Check declared constraints against current telemetry.
///
/// Returns a list of stable violation messages (empty on success). Missing
/// readings count as `0`.
pub fn violations(state: &MissionState) -> Vec<String> {
    let telemetry = state.current();
    let mut errors = Vec::new();

    for (key, threshold) in state.constraints() {
        let Some(rule) = RULES.iter().find(|rule| rule.key == key.as_str()) else {
            debug!(constraint = key.as_str(), "no rule for constraint, ignoring");
            continue;
        };
        let value = telemetry.number_or(rule.reading, 0.0);
        let violated = match rule.bound {
            Bound::Max => value > *threshold,
            Bound::Min => value < *threshold,
        };
        if violated {
            let comparator = match rule.bound {
                Bound::Max => ">",
                Bound::Min => "<",
            };
            errors.push(format!(
                "{key}: {} = {value} {comparator} {threshold}",
                rule.reading
            ));
        }
    }

    errors
}

/// True if `key` has a comparator rule.
pub fn is_known(key: &str) -> bool {
    RULES.iter().any(|rule| rule.key == key)
}
