//! Deterministic, pure logic shared by the mission engine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.

pub mod actions;
pub mod constraints;
pub mod resolution;
pub mod state;
pub mod telemetry;
pub mod types;
