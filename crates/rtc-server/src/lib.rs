//! `rtc-server` — the viewer wire protocol.
//!
//! | Module        | Contents                                              |
//! |---------------|-------------------------------------------------------|
//! | [`command`]   | Inbound colon-delimited command parser                |
//! | [`telemetry`] | Outbound JSON payloads and sentinel framing           |
//! | [`link`]      | `ViewerLink` best-effort channel + acceptor thread    |

pub mod command;
pub mod error;
pub mod link;
pub mod telemetry;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use command::{Command, parse_command};
pub use error::{CommandError, CommandResult};
pub use link::{ViewerLink, spawn_acceptor};
pub use telemetry::{
    CONGESTION_MIN, EdgeTraffic, END_MARKER, OCCUPANCY_REPORT_MIN, START_MARKER, Snapshot,
    VehicleDetail, frame, frame_density, frame_error,
};
