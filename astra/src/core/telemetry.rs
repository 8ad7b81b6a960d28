//! Sparse telemetry snapshots addressed by dotted paths.
//!
//! A snapshot is whatever object the scenario declared under `telemetry`.
//! Handlers only touch the fields they own; everything else is carried
//! through untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Dotted path of the CPU temperature reading.
pub const CPU_TEMPERATURE: &str = "thermal.cpu_temperature";
/// Dotted path of the GPU temperature reading.
pub const GPU_TEMPERATURE: &str = "thermal.gpu_temperature";
pub const POWER_OUTPUT: &str = "power_output";
pub const PANEL_TEMPERATURE: &str = "panel_temperature";
pub const BATTERY_CHARGE: &str = "battery_charge";
pub const FAN_SPEED_RPM: &str = "cooling.fan_speed_rpm";
pub const FAN_STATUS: &str = "cooling.fan_status";
pub const CAMERA: &str = "subsystems.camera";
pub const DATA_TRANSMITTER: &str = "subsystems.data_transmitter";
pub const STATUS: &str = "status";

/// Overall system status reported in `telemetry.status`.
///
/// Scenarios may declare statuses outside the known set; those round-trip
/// through [`SystemStatus::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SystemStatus {
    Operational,
    Recovering,
    DegradedSafe,
    PowerSave,
    Critical,
    Other(String),
}

impl SystemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SystemStatus::Operational => "OPERATIONAL",
            SystemStatus::Recovering => "RECOVERING",
            SystemStatus::DegradedSafe => "DEGRADED_SAFE",
            SystemStatus::PowerSave => "POWER_SAVE",
            SystemStatus::Critical => "CRITICAL",
            SystemStatus::Other(raw) => raw.as_str(),
        }
    }
}

impl From<&str> for SystemStatus {
    fn from(value: &str) -> Self {
        match value {
            "OPERATIONAL" => SystemStatus::Operational,
            "RECOVERING" => SystemStatus::Recovering,
            "DEGRADED_SAFE" => SystemStatus::DegradedSafe,
            "POWER_SAVE" => SystemStatus::PowerSave,
            "CRITICAL" => SystemStatus::Critical,
            other => SystemStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for SystemStatus {
    fn from(value: String) -> Self {
        SystemStatus::from(value.as_str())
    }
}

impl From<SystemStatus> for String {
    fn from(value: SystemStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for SystemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One instant of telemetry: a JSON object with scenario-defined fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Telemetry(Map<String, Value>);

impl Telemetry {
    /// Look up a value by dotted path (`thermal.cpu_temperature`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Numeric reading at `path`, or `None` if absent or not a number.
    pub fn number(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// Numeric reading at `path`, falling back to `default` when absent.
    pub fn number_or(&self, path: &str, default: f64) -> f64 {
        self.number(path).unwrap_or(default)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Current system status. An absent or non-string status reads as empty.
    pub fn status(&self) -> SystemStatus {
        SystemStatus::from(self.text(STATUS).unwrap_or_default())
    }

    pub fn set_status(&mut self, status: SystemStatus) {
        self.set(STATUS, Value::String(status.into()));
    }

    /// Store a number, keeping integral values as JSON integers.
    pub fn set_number(&mut self, path: &str, value: f64) {
        self.set(path, number_value(value));
    }

    pub fn set_text(&mut self, path: &str, value: &str) {
        self.set(path, Value::String(value.to_string()));
    }

    /// Write `value` at `path`, creating intermediate objects as needed.
    ///
    /// A non-object value sitting on an intermediate segment is replaced.
    pub fn set(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };
        let mut current = &mut self.0;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(next) = entry else {
                return;
            };
            current = next;
        }
        current.insert(leaf.to_string(), value);
    }
}

fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Value::Number(Number::from(value as i64));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
