//! Common types shared by the configuration model and the CSR monitor.
//!
//! This module provides:
//! 1. **Register errors:** Contract violations on the CSR id namespace.
//! 2. **Configuration errors:** Recoverable parse and range failures.
//! 3. **Store errors:** I/O and encoding failures of file-backed settings stores.

/// Error types for configuration, persistence, and register access.
pub mod error;

pub use error::{ConfigError, InvalidRegister, StoreError};
