//! Side-effecting helpers: scenario files, config, oracles, exports.

pub mod config;
pub mod mission_log;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod scenario;
