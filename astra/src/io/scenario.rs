//! Scenario loading with schema validation.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use jsonschema::validator_for;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::core::constraints::is_known;
use crate::core::state::Scenario;

const SCENARIO_SCHEMA: &str = include_str!("../../schemas/scenario.schema.json");

/// Failures that abort a mission before any step runs.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("scenario not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("invalid scenario {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

impl ScenarioError {
    fn parse(path: &Path, message: impl Into<String>) -> Self {
        ScenarioError::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Load a scenario file.
///
/// `scenario_id` defaults to the file stem when the document omits it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ScenarioError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(ScenarioError::parse(path, format!("read failed: {err}"))),
    };
    let scenario = parse_scenario(path, &contents)?;
    debug!(
        scenario_id = scenario.scenario_id.as_str(),
        status = %scenario.telemetry.status(),
        constraints = scenario.constraints.len(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Parse scenario text. `path` is used for the default id and error messages.
pub fn parse_scenario(path: &Path, contents: &str) -> Result<Scenario, ScenarioError> {
    let mut value: Value = serde_json::from_str(contents)
        .map_err(|err| ScenarioError::parse(path, format!("parse json: {err}")))?;
    validate_schema(path, &value)?;

    if let Value::Object(doc) = &mut value
        && !doc.contains_key("scenario_id")
    {
        doc.insert(
            "scenario_id".to_string(),
            Value::String(default_scenario_id(path)),
        );
    }

    let scenario: Scenario = serde_json::from_value(value)
        .map_err(|err| ScenarioError::parse(path, format!("deserialize: {err}")))?;
    if !is_safe_scenario_id(&scenario.scenario_id) {
        return Err(ScenarioError::parse(
            path,
            format!(
                "scenario_id {:?} must be a single path segment of [A-Za-z0-9_.-]",
                scenario.scenario_id
            ),
        ));
    }
    for key in scenario.constraints.keys() {
        if !is_known(key) {
            warn!(constraint = key.as_str(), "constraint has no rule and will never fail");
        }
    }
    Ok(scenario)
}

/// Scenario files found directly under `dir`, sorted by path.
pub fn discover_scenarios(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read dir entry in {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Ids name the export directory under the output dir, so they must stay a
/// single plain path segment.
pub fn is_safe_scenario_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn default_scenario_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenario".to_string())
}

fn validate_schema(path: &Path, doc: &Value) -> Result<(), ScenarioError> {
    let schema: Value = serde_json::from_str(SCENARIO_SCHEMA)
        .map_err(|err| ScenarioError::parse(path, format!("parse scenario schema: {err}")))?;
    let compiled = validator_for(&schema)
        .map_err(|err| ScenarioError::parse(path, format!("invalid scenario schema: {err}")))?;
    let messages: Vec<String> = compiled
        .iter_errors(doc)
        .map(|err| err.to_string())
        .collect();
    if !messages.is_empty() {
        return Err(ScenarioError::parse(
            path,
            format!("schema validation failed: {}", messages.join("; ")),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::telemetry::SystemStatus;

    #[test]
    fn missing_file_is_not_found() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = load_scenario(&temp.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, ScenarioError::NotFound { .. }));
    }

    #[test]
    fn missing_status_is_a_parse_error() {
        let err = parse_scenario(
            Path::new("bad.json"),
            r#"{"telemetry": {"power_output": 10}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn non_numeric_constraint_is_a_parse_error() {
        let err = parse_scenario(
            Path::new("bad.json"),
            r#"{"telemetry": {"status": "CRITICAL"}, "constraints": {"max_cpu_temperature": "hot"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
    }

    #[test]
    fn absolute_scenario_id_is_rejected() {
        let err = parse_scenario(
            Path::new("escape.json"),
            r#"{"scenario_id": "/tmp/astra_escape", "telemetry": {"status": "CRITICAL"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
    }

    #[test]
    fn dot_dot_scenario_id_is_rejected() {
        for id in ["..", "../outside", "a/../../b"] {
            let doc = format!(r#"{{"scenario_id": "{id}", "telemetry": {{"status": "CRITICAL"}}}}"#);
            let err = parse_scenario(Path::new("escape.json"), &doc).unwrap_err();
            assert!(matches!(err, ScenarioError::Parse { .. }), "{id} accepted");
        }
    }

    #[test]
    fn unsafe_default_id_from_file_stem_is_rejected() {
        let err = parse_scenario(
            Path::new("my scenario.json"),
            r#"{"telemetry": {"status": "CRITICAL"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("scenario_id"));
    }

    #[test]
    fn safe_ids() {
        assert!(is_safe_scenario_id("thermal_overheat-2.v1"));
        assert!(!is_safe_scenario_id(""));
        assert!(!is_safe_scenario_id("."));
        assert!(!is_safe_scenario_id("a\\b"));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_scenario(Path::new("bad.json"), "{ telemetry: ").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse { .. }));
    }

    #[test]
    fn scenario_id_defaults_to_file_stem() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("thermal_overheat.json");
        fs::write(
            &path,
            r#"{"telemetry": {"status": "CRITICAL", "thermal": {"cpu_temperature": 95}}, "constraints": {"max_cpu_temperature": 85}}"#,
        )
        .expect("write");

        let scenario = load_scenario(&path).expect("load");
        assert_eq!(scenario.scenario_id, "thermal_overheat");
        assert_eq!(scenario.telemetry.status(), SystemStatus::Critical);
        assert_eq!(scenario.constraints.get("max_cpu_temperature"), Some(&85.0));
    }

    #[test]
    fn discover_lists_json_files_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join("b.json"), "{}").expect("write");
        fs::write(temp.path().join("a.json"), "{}").expect("write");
        fs::write(temp.path().join("notes.txt"), "").expect("write");

        let found = discover_scenarios(temp.path()).expect("discover");
        let names: Vec<_> = found
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }
}
