//! Machine configuration and CSR monitoring for the rvsim RISC-V simulator.
//!
//! This crate holds the parts of the simulator front-end that sit around the core:
//! 1. **Configuration:** The architecture model (pipeline, hazard unit, memory timing,
//!    caches, OS emulation, endianness) with presets and key-value persistence.
//! 2. **CSR namespace:** Register ids, names, and the event bus the core emits on.
//! 3. **Monitor:** The per-register highlight tracker used by live register views.

/// Common error types.
pub mod common;
/// Architecture configuration (presets, caches, persistence).
pub mod config;
/// CSR identifiers and the core's CSR event bus.
pub mod csr;
/// CSR highlight tracking for register views.
pub mod monitor;

/// Root configuration type; build with `ArchitectureConfig::from_preset` or load from a store.
pub use crate::config::ArchitectureConfig;
/// Per-level cache configuration.
pub use crate::config::cache::CacheConfig;
/// Register identifier used by the event bus and the tracker.
pub use crate::csr::CsrId;
/// Highlight tracker fed by the core's CSR events.
pub use crate::monitor::RegisterHighlightTracker;
