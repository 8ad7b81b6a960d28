//! Stable exit codes for astra CLI commands.

use crate::core::types::MissionOutcome;

/// Mission resolved, or a non-mission command succeeded.
pub const SUCCESS: i32 = 0;
/// Invalid scenario, config or arguments, or any other error.
pub const INVALID: i32 = 1;
/// Mission ended in FAILURE (critical status or constraint violation).
pub const FAILURE: i32 = 2;
/// Mission exhausted `max_steps`.
pub const TIMEOUT: i32 = 3;
/// Mission stopped by the cancel token.
pub const CANCELLED: i32 = 4;

pub fn for_outcome(outcome: MissionOutcome) -> i32 {
    match outcome {
        MissionOutcome::Success => SUCCESS,
        MissionOutcome::Failure => FAILURE,
        MissionOutcome::Timeout => TIMEOUT,
        MissionOutcome::Cancelled => CANCELLED,
    }
}
