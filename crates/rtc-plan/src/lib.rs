//! `rtc-plan` — agent itineraries and route bookkeeping.
//!
//! | Module                       | Contents                                         |
//! |------------------------------|--------------------------------------------------|
//! | [`demographics`]             | `Demographics`, `Gender`, `IncomeLevel`          |
//! | [`chain`]                    | `ChainEntry`, `DayCursor`, chain re-timing       |
//! | [`catalog`]                  | `ItineraryCatalog` JSON loader                   |
//! | [`store`]                    | `RouteStore` — persisted modified-route records  |

pub mod catalog;
pub mod chain;
pub mod demographics;
pub mod error;
pub mod store;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use catalog::{Itinerary, ItineraryCatalog};
pub use chain::{ChainEntry, DayCursor, lay_out_chain};
pub use demographics::{Demographics, Gender, IncomeLevel};
pub use error::{PlanError, PlanResult};
pub use store::{ModifiedRouteRecord, PlannedStop, RouteStore};
