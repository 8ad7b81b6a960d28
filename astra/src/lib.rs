//! Autonomous mission controller for simulated spacecraft anomalies.
//!
//! A mission starts from a scenario file (telemetry snapshot plus numeric
//! constraints) and runs a bounded sense → decide → act → verify loop until
//! the anomaly is resolved, the system fails, or the step budget runs out.
//! The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (telemetry, actions, constraints,
//!   terminal rules). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (scenario files, config, oracle
//!   processes, mission exports).
//!
//! [`controller`] drives the loop; [`mission`] and [`batch`] coordinate it
//! with I/O to implement CLI commands.

pub mod batch;
pub mod controller;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mission;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
