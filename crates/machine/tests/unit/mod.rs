//! # Unit Tests
//!
//! Tests grouped by the crate module they exercise.

/// Architecture configuration: presets, equality, setters.
pub mod config;



/// Highlight tracker state machine and display contract.
pub mod highlight;
