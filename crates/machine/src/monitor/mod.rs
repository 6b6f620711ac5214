//! Live CSR monitoring.
//!
//! Register views show the current value of every CSR and highlight the ones the
//! core touched during the last clock cycle. This module holds the state behind
//! such a view; choosing colors and laying out rows is left to the front-end.

/// Per-register highlight state machine.
pub mod highlight;

pub use highlight::{
    HighlightKind, HighlightRow, RegisterHighlightState, RegisterHighlightTracker, format_value,
};
