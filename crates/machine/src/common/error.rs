//! Error definitions.
//!
//! Three families of failure exist and they are handled differently:
//! 1. **`InvalidRegister`:** A CSR id of `0` or beyond the register count reached an
//!    accessor. This is a wiring bug in the event source and is always propagated.
//! 2. **`ConfigError`:** A setter rejected its input. The target field is left untouched.
//! 3. **`StoreError`:** A file-backed settings store could not be read or written.

use std::path::PathBuf;

use thiserror::Error;

/// Access to a CSR slot outside the valid id range `1..count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid CSR register id {id} (valid ids are 1..{count})")]
pub struct InvalidRegister {
    /// The offending raw id.
    pub id: usize,
    /// Number of slots in the register namespace, including reserved id 0.
    pub count: usize,
}

/// Recoverable configuration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Hazard unit name is not one of `none`, `stall`, `stall-forward`.
    #[error("unknown hazard unit `{0}` (expected none, stall or stall-forward)")]
    UnknownHazardUnit(String),

    /// Preset name or ordinal does not match any preset.
    #[error("unknown configuration preset `{0}`")]
    UnknownPreset(String),

    /// Endianness name is not `little` or `big`.
    #[error("unknown endianness `{0}` (expected little or big)")]
    UnknownEndianness(String),

    /// Cache replacement policy name is not recognized.
    #[error("unknown cache replacement policy `{0}`")]
    UnknownReplacementPolicy(String),

    /// Cache write policy name is not recognized.
    #[error("unknown cache write policy `{0}`")]
    UnknownWritePolicy(String),

    /// A cache geometry field was set to zero.
    #[error("cache {field} must be non-zero")]
    ZeroCacheGeometry {
        /// Name of the rejected field.
        field: &'static str,
    },
}

/// Failures of the file-backed settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("settings file {path}: {source}")]
    Io {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a flat JSON object of strings.
    #[error("settings file {path} is malformed: {source}")]
    Json {
        /// Path of the backing file.
        path: PathBuf,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}
