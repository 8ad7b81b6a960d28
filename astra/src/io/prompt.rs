//! Decision prompt rendering for command-backed oracles.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::state::MissionState;
use crate::core::types::Action;

const DECISION_TEMPLATE: &str = include_str!("prompts/decision.md");

#[derive(Debug, Clone, Serialize)]
struct ConstraintContext {
    name: String,
    threshold: f64,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("decision", DECISION_TEMPLATE)
            .context("load decision template")?;
        Ok(Self { env })
    }

    /// Render the decision prompt for the current mission state.
    pub fn render_decision(&self, state: &MissionState) -> Result<String> {
        let telemetry =
            serde_json::to_string_pretty(state.current()).context("serialize telemetry")?;
        let previous_changed = state.previous() != state.current();
        let previous = if previous_changed {
            serde_json::to_string_pretty(state.previous()).context("serialize previous")?
        } else {
            String::new()
        };
        let constraints: Vec<ConstraintContext> = state
            .constraints()
            .iter()
            .map(|(name, threshold)| ConstraintContext {
                name: name.clone(),
                threshold: *threshold,
            })
            .collect();
        let actions: Vec<&str> = Action::ALL.iter().map(|a| a.as_str()).collect();

        let template = self.env.get_template("decision")?;
        let rendered = template.render(context! {
            scenario_id => state.scenario_id(),
            status => state.current().status().as_str(),
            telemetry => telemetry,
            constraints => constraints,
            previous_changed => previous_changed,
            previous => previous,
            actions => actions,
        })?;
        debug!(bytes = rendered.len(), "rendered decision prompt");
        Ok(rendered)
    }
}
