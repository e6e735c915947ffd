//! Outbound telemetry payloads and framing.
//!
//! Every outbound message is a UTF-8 JSON object terminated by the literal
//! `<<END>>` sentinel.  The oversized all-vehicles density payload is
//! additionally prefixed with `<<START>>` so the receiver can tell it apart
//! from ordinary messages sharing the same byte stream.

use std::collections::BTreeMap;

use serde::Serialize;

use rtc_core::{AgentId, EdgeId};
use rtc_plan::{Demographics, PlannedStop};

pub const END_MARKER: &str = "<<END>>";
pub const START_MARKER: &str = "<<START>>";

/// Report an edge at all above this occupancy.
pub const OCCUPANCY_REPORT_MIN: f64 = 0.3;
/// Flag an edge congested above this occupancy.
pub const CONGESTION_MIN: f64 = 0.5;

// ── Payload types ─────────────────────────────────────────────────────────────

/// Per-vehicle detail.  All fields optional: position-only payloads (plot
/// data, density) fill just what they carry, and the periodic snapshot fills
/// the full set for the highlighted vehicle only.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VehicleDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat_lon: Option<[f64; 3]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<EdgeId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_edge: Option<EdgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_index: Option<usize>,
    /// `"modified"` when a route-store record exists, else `"original"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poi_sequence: Option<Vec<PlannedStop>>,
}

/// Traffic state for one edge of the highlighted vehicle's route.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct EdgeTraffic {
    pub occupancy: f64,
    pub is_congested: bool,
}

impl EdgeTraffic {
    /// `Some` only when the edge is worth reporting at all.
    pub fn from_occupancy(occupancy: f64) -> Option<Self> {
        let is_congested = occupancy > CONGESTION_MIN;
        (is_congested || occupancy > OCCUPANCY_REPORT_MIN)
            .then_some(Self { occupancy, is_congested })
    }
}

/// The top-level telemetry object.
#[derive(Debug, Default, Serialize)]
pub struct Snapshot {
    pub time: f64,
    pub vehicles: Vec<AgentId>,
    pub closed_edges: Vec<EdgeId>,
    pub vehicle_data: BTreeMap<AgentId, VehicleDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traffic_info: Option<BTreeMap<EdgeId, EdgeTraffic>>,
    /// `"density_data"` on `GET_ALL_VEHICLES` replies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_count: Option<usize>,
}

// ── Framing ───────────────────────────────────────────────────────────────────

/// JSON + end marker.
pub fn frame<T: Serialize>(payload: &T) -> serde_json::Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec(payload)?;
    bytes.extend_from_slice(END_MARKER.as_bytes());
    Ok(bytes)
}

/// Start marker + JSON + end marker, for the density payload.
pub fn frame_density<T: Serialize>(payload: &T) -> serde_json::Result<Vec<u8>> {
    let mut bytes = START_MARKER.as_bytes().to_vec();
    bytes.extend_from_slice(&serde_json::to_vec(payload)?);
    bytes.extend_from_slice(END_MARKER.as_bytes());
    Ok(bytes)
}

/// Framed `{"error": ...}` object, for single-vehicle query failures.
pub fn frame_error(message: &str) -> Vec<u8> {
    #[derive(Serialize)]
    struct ErrorReply<'a> {
        error: &'a str,
    }
    // Serializing a flat string map cannot fail.
    frame(&ErrorReply { error: message }).unwrap_or_default()
}
