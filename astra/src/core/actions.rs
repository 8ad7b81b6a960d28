//! Action executor: the closed catalog of telemetry handlers.
//!
//! Each [`Action`] maps to exactly one handler function. Handlers mutate only
//! the fields listed for them and set the resulting status; readings they need
//! but that are absent (or non-numeric) fall back to fixed per-handler defaults
//! so repeated runs of a freshly loaded scenario are deterministic.

use tracing::debug;

use crate::core::state::MissionState;
use crate::core::telemetry::{
    BATTERY_CHARGE, CAMERA, CPU_TEMPERATURE, DATA_TRANSMITTER, FAN_SPEED_RPM, FAN_STATUS,
    GPU_TEMPERATURE, PANEL_TEMPERATURE, POWER_OUTPUT, SystemStatus, Telemetry,
};
use crate::core::types::{Action, ActionId};

/// Handler signature shared by every catalog entry.
pub type Handler = fn(&mut Telemetry);

const COOLING_FAN_RPM: f64 = 3000.0;
const CPU_DEFAULT: f64 = 100.0;
const CPU_COOLING_DROP: f64 = 25.0;
const CPU_FLOOR: f64 = 60.0;
const GPU_DEFAULT: f64 = 85.0;
const GPU_COOLING_DROP: f64 = 15.0;
const GPU_FLOOR: f64 = 55.0;

const POWER_DEFAULT: f64 = 0.0;
const PANEL_POWER_GAIN: f64 = 30.0;
const PANEL_TEMPERATURE_DEFAULT: f64 = 90.0;
const PANEL_TEMPERATURE_DROP: f64 = 10.0;
const PANEL_TEMPERATURE_FLOOR: f64 = 40.0;

const BATTERY_DEFAULT: f64 = 0.0;
const BATTERY_SAVE_GAIN: f64 = 5.0;
const BATTERY_CEILING: f64 = 100.0;

impl Action {
    /// Handler for this catalog entry.
    pub fn handler(self) -> Handler {
        match self {
            Action::ActivateCooling => activate_cooling,
            Action::RedeployPanels => redeploy_panels,
            Action::PowerSaveMode => power_save_mode,
            Action::EnterDegradedMode => enter_degraded_mode,
            Action::NoAction => no_action,
        }
    }
}

/// Apply `action` to `state.current` and return the resulting snapshot.
///
/// The current snapshot is committed as `previous` first, for every action
/// including `NO_ACTION` and unknown identifiers; those two leave telemetry
/// untouched.
pub fn apply(state: &mut MissionState, action: &ActionId) -> Telemetry {
    state.commit_before_mutation();
    match action {
        ActionId::Known(known) => {
            debug!(action = known.as_str(), "applying action");
            (known.handler())(state.current_mut());
        }
        ActionId::Unknown(raw) => {
            debug!(action = raw.as_str(), "unknown action, telemetry unchanged");
        }
    }
    state.snapshot()
}

fn activate_cooling(telemetry: &mut Telemetry) {
    telemetry.set_number(FAN_SPEED_RPM, COOLING_FAN_RPM);
    telemetry.set_text(FAN_STATUS, "ACTIVE");

    let cpu = telemetry.number_or(CPU_TEMPERATURE, CPU_DEFAULT);
    telemetry.set_number(CPU_TEMPERATURE, (cpu - CPU_COOLING_DROP).max(CPU_FLOOR));
    let gpu = telemetry.number_or(GPU_TEMPERATURE, GPU_DEFAULT);
    telemetry.set_number(GPU_TEMPERATURE, (gpu - GPU_COOLING_DROP).max(GPU_FLOOR));

    telemetry.set_status(SystemStatus::Recovering);
}

fn redeploy_panels(telemetry: &mut Telemetry) {
    let power = telemetry.number_or(POWER_OUTPUT, POWER_DEFAULT);
    telemetry.set_number(POWER_OUTPUT, power + PANEL_POWER_GAIN);
    let panel = telemetry.number_or(PANEL_TEMPERATURE, PANEL_TEMPERATURE_DEFAULT);
    telemetry.set_number(
        PANEL_TEMPERATURE,
        (panel - PANEL_TEMPERATURE_DROP).max(PANEL_TEMPERATURE_FLOOR),
    );

    telemetry.set_status(SystemStatus::Operational);
}

fn power_save_mode(telemetry: &mut Telemetry) {
    let battery = telemetry.number_or(BATTERY_CHARGE, BATTERY_DEFAULT);
    telemetry.set_number(
        BATTERY_CHARGE,
        (battery + BATTERY_SAVE_GAIN).min(BATTERY_CEILING),
    );
    telemetry.set_text(CAMERA, "OFF");

    telemetry.set_status(SystemStatus::PowerSave);
}

fn enter_degraded_mode(telemetry: &mut Telemetry) {
    telemetry.set_text(CAMERA, "OFF");
    telemetry.set_text(DATA_TRANSMITTER, "LIMITED");

    telemetry.set_status(SystemStatus::DegradedSafe);
}

fn no_action(_telemetry: &mut Telemetry) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_from_json;
    use serde_json::json;

    #[test]
    fn no_action_leaves_current_unchanged() {
        let mut state = state_from_json(
            json!({"status": "CRITICAL", "thermal": {"cpu_temperature": 95}, "extra": [1, 2]}),
            json!({}),
        );
        let before = state.snapshot();
        let after = apply(&mut state, &Action::NoAction.into());
        assert_eq!(after, before);
        assert_eq!(state.previous(), &before);
    }

    #[test]
    fn unknown_action_is_a_telemetry_no_op() {
        let mut state = state_from_json(json!({"status": "CRITICAL"}), json!({}));
        let before = state.snapshot();
        apply(&mut state, &ActionId::parse("SELF_DESTRUCT"));
        assert_eq!(state.current(), &before);
    }

    #[test]
    fn cooling_drops_temperatures_and_spins_fans() {
        let mut state = state_from_json(
            json!({"status": "CRITICAL", "thermal": {"cpu_temperature": 95, "gpu_temperature": 80}}),
            json!({}),
        );
        let after = apply(&mut state, &Action::ActivateCooling.into());
        assert_eq!(after.number(CPU_TEMPERATURE), Some(70.0));
        assert_eq!(after.number(GPU_TEMPERATURE), Some(65.0));
        assert_eq!(after.number(FAN_SPEED_RPM), Some(3000.0));
        assert_eq!(after.text(FAN_STATUS), Some("ACTIVE"));
        assert_eq!(after.status(), SystemStatus::Recovering);
    }

    #[test]
    fn cooling_never_goes_below_floors() {
        for start in [-40.0, 0.0, 61.0, 70.0, 84.9, 200.0] {
            let mut state = state_from_json(
                json!({"status": "CRITICAL", "thermal": {"cpu_temperature": start, "gpu_temperature": start}}),
                json!({}),
            );
            for _ in 0..3 {
                let after = apply(&mut state, &Action::ActivateCooling.into());
                assert!(after.number_or(CPU_TEMPERATURE, 0.0) >= CPU_FLOOR);
                assert!(after.number_or(GPU_TEMPERATURE, 0.0) >= GPU_FLOOR);
            }
        }
    }

    #[test]
    fn cooling_uses_defaults_for_missing_readings() {
        let mut state = state_from_json(json!({"status": "CRITICAL"}), json!({}));
        let after = apply(&mut state, &Action::ActivateCooling.into());
        assert_eq!(after.number(CPU_TEMPERATURE), Some(75.0));
        assert_eq!(after.number(GPU_TEMPERATURE), Some(70.0));
    }

    #[test]
    fn redeploying_twice_adds_sixty_power() {
        let mut state = state_from_json(
            json!({"status": "DEGRADED", "power_output": 42.5, "panel_temperature": 95}),
            json!({}),
        );
        apply(&mut state, &Action::RedeployPanels.into());
        let after = apply(&mut state, &Action::RedeployPanels.into());
        assert_eq!(after.number(POWER_OUTPUT), Some(102.5));
        assert_eq!(after.number(PANEL_TEMPERATURE), Some(75.0));
        assert_eq!(after.status(), SystemStatus::Operational);
    }

    #[test]
    fn redeploy_clamps_panel_temperature_and_defaults_missing_power() {
        let mut state = state_from_json(json!({"status": "DEGRADED", "panel_temperature": 45}), json!({}));
        let after = apply(&mut state, &Action::RedeployPanels.into());
        assert_eq!(after.number(POWER_OUTPUT), Some(30.0));
        assert_eq!(after.number(PANEL_TEMPERATURE), Some(40.0));
    }

    #[test]
    fn power_save_caps_battery_and_turns_camera_off() {
        let mut state = state_from_json(
            json!({"status": "LOW_POWER", "battery_charge": 98, "subsystems": {"camera": "ON", "data_transmitter": "ON"}}),
            json!({}),
        );
        let after = apply(&mut state, &Action::PowerSaveMode.into());
        assert_eq!(after.number(BATTERY_CHARGE), Some(100.0));
        assert_eq!(after.text(CAMERA), Some("OFF"));
        assert_eq!(after.text(DATA_TRANSMITTER), Some("ON"));
        assert_eq!(after.status(), SystemStatus::PowerSave);
    }

    #[test]
    fn degraded_mode_limits_subsystems_only() {
        let mut state = state_from_json(
            json!({"status": "CRITICAL", "battery_charge": 20, "subsystems": {"camera": "ON"}}),
            json!({}),
        );
        let after = apply(&mut state, &Action::EnterDegradedMode.into());
        assert_eq!(after.text(CAMERA), Some("OFF"));
        assert_eq!(after.text(DATA_TRANSMITTER), Some("LIMITED"));
        assert_eq!(after.number(BATTERY_CHARGE), Some(20.0));
        assert_eq!(after.status(), SystemStatus::DegradedSafe);
    }

    #[test]
    fn apply_commits_previous_before_mutating() {
        let mut state = state_from_json(json!({"status": "CRITICAL", "power_output": 10}), json!({}));
        apply(&mut state, &Action::RedeployPanels.into());
        let after_first = state.snapshot();
        apply(&mut state, &Action::RedeployPanels.into());
        assert_eq!(state.previous(), &after_first);
    }
}
