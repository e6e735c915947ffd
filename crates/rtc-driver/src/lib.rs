//! `rtc-driver` — the control loop that ties everything together.
//!
//! | Module     | Contents                                        |
//! |------------|-------------------------------------------------|
//! | [`config`] | `DriverConfig` run tunables                     |
//! | [`driver`] | `Driver` state machine, tick loop, and dispatch |
//! | [`error`]  | `DriverError`                                   |

pub mod config;
pub mod driver;
pub mod error;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::DriverConfig;
pub use driver::{Driver, DriverState};
pub use error::{DriverError, DriverResult};
