//! `rtc-control` — the three stateful managers of the control core.
//!
//! | Module      | Contents                                                    |
//! |-------------|-------------------------------------------------------------|
//! | [`closure`] | `ClosureManager` — closed-edge set, nearby/affected queries |
//! | [`event`]   | `Event`, `InterestModel` — demographic attendance ranking   |
//! | [`route`]   | `RouteApplier` — destination lists to engine-valid routes   |
//!
//! All three mutate the engine only through the [`rtc_engine::TrafficEngine`]
//! trait and are driven strictly sequentially from the tick loop, so none of
//! them carries any synchronization.

pub mod closure;
pub mod error;
pub mod event;
pub mod route;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use closure::{AffectedAgent, ClosureManager, NearbyPoi};
pub use error::{ControlError, ControlResult};
pub use event::{Event, EventKind, EventWindow, InterestModel};
pub use route::{DEFAULT_STOP_SECS, RouteApplier};
