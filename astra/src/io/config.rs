//! Mission configuration stored as TOML (default `astra.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Mission configuration (TOML).
///
/// This file is intended to be edited by humans. Missing fields default to
/// the values used by the reference missions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MissionConfig {
    /// Upper bound on loop iterations per mission.
    pub max_steps: u32,

    /// Wall-clock budget for a single oracle decision, in seconds.
    pub decision_timeout_secs: u64,

    /// Pause between steps, in milliseconds.
    pub step_delay_ms: u64,

    /// Directory that receives mission logs and summaries.
    pub output_dir: PathBuf,

    /// Truncate captured oracle stdout/stderr beyond this many bytes.
    pub oracle_output_limit_bytes: usize,

    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleKind {
    /// Built-in rule cascade.
    #[default]
    Rules,
    /// External command reading a prompt on stdin and answering JSON on stdout.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    pub kind: OracleKind,
    /// Command to execute for `kind = "command"` (e.g. `["./llm-oracle", "--json"]`).
    pub command: Vec<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            kind: OracleKind::Rules,
            command: Vec::new(),
        }
    }
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            decision_timeout_secs: 30,
            step_delay_ms: 0,
            output_dir: PathBuf::from("missions"),
            oracle_output_limit_bytes: 100_000,
            oracle: OracleConfig::default(),
        }
    }
}

impl MissionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(anyhow!("max_steps must be > 0"));
        }
        if self.decision_timeout_secs == 0 {
            return Err(anyhow!("decision_timeout_secs must be > 0"));
        }
        if self.oracle_output_limit_bytes == 0 {
            return Err(anyhow!("oracle_output_limit_bytes must be > 0"));
        }
        if self.oracle.kind == OracleKind::Command
            && (self.oracle.command.is_empty() || self.oracle.command[0].trim().is_empty())
        {
            return Err(anyhow!(
                "oracle.command must be a non-empty array when oracle.kind = \"command\""
            ));
        }
        Ok(())
    }

    pub fn decision_timeout(&self) -> Duration {
        Duration::from_secs(self.decision_timeout_secs)
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `MissionConfig::default()`.
pub fn load_config(path: &Path) -> Result<MissionConfig> {
    if !path.exists() {
        let cfg = MissionConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: MissionConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &MissionConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
