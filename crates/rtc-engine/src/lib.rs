//! `rtc-engine` — the traffic-engine seam.
//!
//! The control core never owns vehicle physics or routing; it consumes an
//! external, authoritative simulation engine through the [`TrafficEngine`]
//! trait.  A production binding implements the trait over the engine's RPC
//! protocol; tests and demos use [`MockEngine`].
//!
//! # Failure model
//!
//! Every method returns an [`EngineResult`].  Callers in the control core
//! treat single-vehicle / single-edge failures as non-fatal: they are logged
//! and skipped, and the tick loop continues.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{EngineError, EngineResult};
pub use mock::MockEngine;
pub use traits::{StopParams, TrafficEngine, PASSENGER_CLASS};
