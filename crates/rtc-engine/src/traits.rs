//! The [`TrafficEngine`] trait — every engine capability the control core
//! consumes, and nothing more.
//!
//! # Pluggability
//!
//! The driver, managers, and applier are generic over `E: TrafficEngine`, so
//! a production RPC binding and the in-memory [`MockEngine`][crate::MockEngine]
//! are interchangeable at compile time with no runtime overhead.
//!
//! # Units and spaces
//!
//! - Time: seconds on the engine's own clock (`f64`).
//! - Planar positions and edge shapes: the engine's metre grid.
//! - Geographic positions: WGS-84 via the engine's projection.

use rtc_core::{AgentId, EdgeId, GeoPoint};

use crate::EngineResult;

/// Vehicle class used when picking a stop lane: a lane is usable when its
/// allow-list is empty (unrestricted) or contains this class.
pub const PASSENGER_CLASS: &str = "passenger";

/// Parameters for placing (or clearing) a stop at an edge.
#[derive(Debug, Clone, PartialEq)]
pub struct StopParams {
    pub edge: EdgeId,
    /// Position along the lane, metres from its start.
    pub pos_m: f64,
    pub lane: usize,
    /// How long the vehicle stays stopped, seconds.  Zero clears an active
    /// stop on the edge.
    pub duration_secs: u32,
    /// Park off the driving lane rather than halting in traffic.
    pub parking: bool,
}

/// Abstract capability surface of the external traffic simulation engine.
///
/// Mutating operations take `&mut self`; queries take `&self`.  The control
/// core serializes all access from its tick loop, so implementations need no
/// internal locking.
pub trait TrafficEngine {
    // ── Simulation control ────────────────────────────────────────────────

    /// Advance the simulation by one step.
    fn step(&mut self) -> EngineResult<()>;

    /// Current simulation clock, seconds.
    fn time(&self) -> EngineResult<f64>;

    // ── Vehicle queries ───────────────────────────────────────────────────

    /// Ids of all vehicles currently active in the simulation.
    fn vehicle_ids(&self) -> EngineResult<Vec<AgentId>>;

    /// The vehicle's full route as an ordered edge list.
    fn route(&self, vehicle: &AgentId) -> EngineResult<Vec<EdgeId>>;

    /// Index into the route of the edge the vehicle is currently traversing.
    fn route_index(&self, vehicle: &AgentId) -> EngineResult<usize>;

    /// The edge the vehicle currently occupies (may be engine-internal).
    fn current_edge(&self, vehicle: &AgentId) -> EngineResult<EdgeId>;

    /// Planar position in the engine's metre grid.
    fn position(&self, vehicle: &AgentId) -> EngineResult<(f64, f64)>;

    /// Geographic position `(lat, lon, alt)` via the engine's projection.
    fn geo_position(&self, vehicle: &AgentId) -> EngineResult<(f64, f64, f64)>;

    /// Current speed, m/s.
    fn speed(&self, vehicle: &AgentId) -> EngineResult<f64>;

    /// Whether the vehicle is currently serving a stop.
    fn is_stopped(&self, vehicle: &AgentId) -> EngineResult<bool>;

    // ── Vehicle mutations ─────────────────────────────────────────────────

    /// Replace the vehicle's route.  The engine requires the first edge to
    /// be the vehicle's current edge; pushing a single-edge placeholder
    /// first clears stops incompatible with the new route.
    fn set_route(&mut self, vehicle: &AgentId, route: &[EdgeId]) -> EngineResult<()>;

    /// Place (or, with `duration_secs == 0`, clear) a stop.
    fn set_stop(&mut self, vehicle: &AgentId, stop: &StopParams) -> EngineResult<()>;

    /// Mark a vehicle as the visually tracked one, or reset it.
    fn set_highlight(&mut self, vehicle: &AgentId, on: bool) -> EngineResult<()>;

    // ── Network queries ───────────────────────────────────────────────────

    /// Shortest path between two edges, inclusive of both endpoints.
    fn find_path(&self, from: &EdgeId, to: &EdgeId) -> EngineResult<Vec<EdgeId>>;

    /// Fraction of the edge occupied by vehicles last step, 0.0–1.0.
    fn edge_occupancy(&self, edge: &EdgeId) -> EngineResult<f64>;

    /// All edge ids in the network.
    fn edge_ids(&self) -> EngineResult<Vec<EdgeId>>;

    /// Shape polyline of an edge in planar metre coordinates.
    fn edge_shape(&self, edge: &EdgeId) -> EngineResult<Vec<(f64, f64)>>;

    /// Number of lanes on an edge.
    fn lane_count(&self, edge: &EdgeId) -> EngineResult<usize>;

    /// Vehicle classes allowed on a lane.  Empty means unrestricted.
    fn lane_allowed(&self, edge: &EdgeId, lane: usize) -> EngineResult<Vec<String>>;

    /// Length of a lane, metres.
    fn lane_length(&self, edge: &EdgeId, lane: usize) -> EngineResult<f64>;

    // ── Network mutations ─────────────────────────────────────────────────

    /// Disallow all traffic on an edge (road closure).
    fn disallow_all(&mut self, edge: &EdgeId) -> EngineResult<()>;

    /// Restore unrestricted traffic on an edge.
    fn allow_all(&mut self, edge: &EdgeId) -> EngineResult<()>;

    // ── Coordinate mapping ────────────────────────────────────────────────

    /// Map a planar engine position to geographic coordinates.
    fn to_geo(&self, x: f64, y: f64) -> EngineResult<GeoPoint>;

    /// Map geographic coordinates to the engine's planar grid.
    fn to_plane(&self, point: GeoPoint) -> EngineResult<(f64, f64)>;
}
