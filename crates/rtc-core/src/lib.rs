//! `rtc-core` — foundational types for the `rust_rtc` real-time control core.
//!
//! This crate is a dependency of every other `rtc-*` crate.  It intentionally
//! has no `rtc-*` dependencies, only `serde` — everything here is plain data
//! and total functions, so failure enums live in the crates that can fail.
//!
//! # What lives here
//!
//! | Module   | Contents                                                |
//! |----------|---------------------------------------------------------|
//! | [`ids`]  | `AgentId`, `EdgeId`, `PoiId` — engine-native string ids |
//! | [`geo`]  | `GeoPoint`, haversine distance, point-to-segment helper |
//! | [`time`] | Quarter-hour time model (96 per day), `HH:MM` parsing   |

pub mod geo;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use geo::GeoPoint;
pub use ids::{AgentId, EdgeId, PoiId};
