//! `rtc-poi` — the static point-of-interest catalog.
//!
//! Loaded once at startup and read-only thereafter.  Every POI binds a
//! display name and geographic coordinate to the road edge nearest it, which
//! is what lets destination names from operators and the chain advisor be
//! turned into engine-valid stop edges.

pub mod catalog;
pub mod error;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use catalog::{Poi, PoiCatalog};
pub use error::{PoiError, PoiResult};
