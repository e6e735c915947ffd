//! `MockEngine` — a deterministic in-memory [`TrafficEngine`].
//!
//! Used by the test suites of every crate above this one and by the
//! `mock_run` demo.  It models just enough of a traffic engine to exercise
//! the control core: a static edge set with shapes and lanes, vehicles with
//! routes, scripted shortest paths, scheduled spawns, and a closed-edge set
//! that mirrors `disallow_all`/`allow_all`.
//!
//! Every trait call bumps an RPC counter so tests can assert that a code
//! path made *no* engine calls (the pending-modification contract).

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use rtc_core::{AgentId, EdgeId, GeoPoint};

use crate::traits::{StopParams, TrafficEngine};
use crate::{EngineError, EngineResult};

// ── Internal records ──────────────────────────────────────────────────────────

#[derive(Clone)]
struct MockEdge {
    shape: Vec<(f64, f64)>,
    /// Allow-list per lane; an empty list means unrestricted.
    lanes: Vec<Vec<String>>,
    occupancy: f64,
}

impl MockEdge {
    fn length_m(&self) -> f64 {
        self.shape
            .windows(2)
            .map(|w| {
                let (ax, ay) = w[0];
                let (bx, by) = w[1];
                ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
            })
            .sum()
    }
}

#[derive(Clone)]
struct MockVehicle {
    route: Vec<EdgeId>,
    route_index: usize,
    position: (f64, f64),
    speed: f64,
    stopped: bool,
    highlighted: bool,
}

// ── MockEngine ────────────────────────────────────────────────────────────────

/// In-memory engine with scripted paths and scheduled spawns.
///
/// Metre-per-degree conversion around `origin` stands in for the engine's
/// projection; accuracy is irrelevant as long as `to_geo`/`to_plane` invert
/// each other.
pub struct MockEngine {
    clock: f64,
    step_secs: f64,
    origin: GeoPoint,

    edges: BTreeMap<EdgeId, MockEdge>,
    vehicles: BTreeMap<AgentId, MockVehicle>,
    /// `(spawn_at_secs, id, vehicle)` — moved into `vehicles` by `step`.
    pending: Vec<(f64, AgentId, MockVehicle)>,
    /// Scripted shortest paths, keyed by `(from, to)`.
    paths: HashMap<(EdgeId, EdgeId), Vec<EdgeId>>,
    disallowed: BTreeSet<EdgeId>,

    /// Every `set_stop` in call order, for assertions.
    pub stop_log: Vec<(AgentId, StopParams)>,
    /// Every `set_route` in call order, for assertions.
    pub route_log: Vec<(AgentId, Vec<EdgeId>)>,

    calls: Cell<u64>,
}

const METERS_PER_DEG: f64 = 111_320.0;

impl MockEngine {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            step_secs: 1.0,
            origin: GeoPoint::new(34.0689, -118.4452),
            edges: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            pending: Vec::new(),
            paths: HashMap::new(),
            disallowed: BTreeSet::new(),
            stop_log: Vec::new(),
            route_log: Vec::new(),
            calls: Cell::new(0),
        }
    }

    // ── Fixture construction ──────────────────────────────────────────────

    /// Add an edge with a shape polyline and one unrestricted lane.
    pub fn add_edge(&mut self, id: impl Into<EdgeId>, shape: Vec<(f64, f64)>) -> &mut Self {
        self.add_edge_with_lanes(id, shape, vec![vec![]])
    }

    /// Add an edge with explicit per-lane allow-lists.
    pub fn add_edge_with_lanes(
        &mut self,
        id: impl Into<EdgeId>,
        shape: Vec<(f64, f64)>,
        lanes: Vec<Vec<String>>,
    ) -> &mut Self {
        self.edges.insert(
            id.into(),
            MockEdge { shape, lanes, occupancy: 0.0 },
        );
        self
    }

    pub fn set_occupancy(&mut self, edge: &EdgeId, occupancy: f64) {
        if let Some(e) = self.edges.get_mut(edge) {
            e.occupancy = occupancy;
        }
    }

    /// Spawn a vehicle immediately, positioned at the start of its route.
    pub fn add_vehicle(&mut self, id: impl Into<AgentId>, route: Vec<EdgeId>) -> &mut Self {
        let vehicle = self.make_vehicle(&route);
        self.vehicles.insert(id.into(), vehicle);
        self
    }

    /// Spawn a vehicle when the clock reaches `at_secs`.
    pub fn schedule_spawn(
        &mut self,
        id: impl Into<AgentId>,
        at_secs: f64,
        route: Vec<EdgeId>,
    ) -> &mut Self {
        let vehicle = self.make_vehicle(&route);
        self.pending.push((at_secs, id.into(), vehicle));
        self
    }

    /// Script the shortest path returned for `(from, to)`.  Unscripted pairs
    /// fall back to the two-edge path `[from, to]` when both edges exist.
    pub fn script_path(
        &mut self,
        from: impl Into<EdgeId>,
        to: impl Into<EdgeId>,
        path: Vec<EdgeId>,
    ) -> &mut Self {
        self.paths.insert((from.into(), to.into()), path);
        self
    }

    fn make_vehicle(&self, route: &[EdgeId]) -> MockVehicle {
        let position = route
            .first()
            .and_then(|e| self.edges.get(e))
            .and_then(|e| e.shape.first().copied())
            .unwrap_or((0.0, 0.0));
        MockVehicle {
            route: route.to_vec(),
            route_index: 0,
            position,
            speed: 8.0,
            stopped: false,
            highlighted: false,
        }
    }

    // ── Test-side inspection ──────────────────────────────────────────────

    /// Edges currently disallowed, for invariant checks against the
    /// closure manager's own set.
    pub fn disallowed_edges(&self) -> &BTreeSet<EdgeId> {
        &self.disallowed
    }

    /// Total trait-method invocations so far.
    pub fn rpc_calls(&self) -> u64 {
        self.calls.get()
    }

    pub fn is_highlighted(&self, vehicle: &AgentId) -> bool {
        self.vehicles.get(vehicle).is_some_and(|v| v.highlighted)
    }

    /// Move a vehicle's route cursor forward, as if it had driven on.
    pub fn advance_vehicle(&mut self, vehicle: &AgentId, to_index: usize) {
        if let Some(v) = self.vehicles.get_mut(vehicle) {
            v.route_index = to_index.min(v.route.len().saturating_sub(1));
        }
    }

    // ── Lookup helpers ────────────────────────────────────────────────────

    fn bump(&self) {
        self.calls.set(self.calls.get() + 1);
    }

    fn vehicle(&self, id: &AgentId) -> EngineResult<&MockVehicle> {
        self.vehicles
            .get(id)
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))
    }

    fn vehicle_mut(&mut self, id: &AgentId) -> EngineResult<&mut MockVehicle> {
        self.vehicles
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownVehicle(id.clone()))
    }

    fn edge(&self, id: &EdgeId) -> EngineResult<&MockEdge> {
        self.edges
            .get(id)
            .ok_or_else(|| EngineError::UnknownEdge(id.clone()))
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ── TrafficEngine impl ────────────────────────────────────────────────────────

impl TrafficEngine for MockEngine {
    fn step(&mut self) -> EngineResult<()> {
        self.bump();
        self.clock += self.step_secs;
        let clock = self.clock;
        // Stable ordering: pending entries spawn in schedule order.
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0 <= clock {
                let (_, id, vehicle) = self.pending.remove(i);
                self.vehicles.insert(id, vehicle);
            } else {
                i += 1;
            }
        }
        Ok(())
    }

    fn time(&self) -> EngineResult<f64> {
        self.bump();
        Ok(self.clock)
    }

    fn vehicle_ids(&self) -> EngineResult<Vec<AgentId>> {
        self.bump();
        Ok(self.vehicles.keys().cloned().collect())
    }

    fn route(&self, vehicle: &AgentId) -> EngineResult<Vec<EdgeId>> {
        self.bump();
        Ok(self.vehicle(vehicle)?.route.clone())
    }

    fn route_index(&self, vehicle: &AgentId) -> EngineResult<usize> {
        self.bump();
        Ok(self.vehicle(vehicle)?.route_index)
    }

    fn current_edge(&self, vehicle: &AgentId) -> EngineResult<EdgeId> {
        self.bump();
        let v = self.vehicle(vehicle)?;
        v.route
            .get(v.route_index)
            .cloned()
            .ok_or_else(|| EngineError::UnknownVehicle(vehicle.clone()))
    }

    fn position(&self, vehicle: &AgentId) -> EngineResult<(f64, f64)> {
        self.bump();
        Ok(self.vehicle(vehicle)?.position)
    }

    fn geo_position(&self, vehicle: &AgentId) -> EngineResult<(f64, f64, f64)> {
        self.bump();
        let (x, y) = self.vehicle(vehicle)?.position;
        let geo = GeoPoint::new(
            self.origin.lat + y / METERS_PER_DEG,
            self.origin.lon + x / METERS_PER_DEG,
        );
        Ok((geo.lat, geo.lon, 0.0))
    }

    fn speed(&self, vehicle: &AgentId) -> EngineResult<f64> {
        self.bump();
        Ok(self.vehicle(vehicle)?.speed)
    }

    fn is_stopped(&self, vehicle: &AgentId) -> EngineResult<bool> {
        self.bump();
        Ok(self.vehicle(vehicle)?.stopped)
    }

    fn set_route(&mut self, vehicle: &AgentId, route: &[EdgeId]) -> EngineResult<()> {
        self.bump();
        let v = self.vehicle_mut(vehicle)?;
        v.route = route.to_vec();
        v.route_index = 0;
        self.route_log.push((vehicle.clone(), route.to_vec()));
        Ok(())
    }

    fn set_stop(&mut self, vehicle: &AgentId, stop: &StopParams) -> EngineResult<()> {
        self.bump();
        let edge = self.edge(&stop.edge)?;
        if stop.lane >= edge.lanes.len() {
            return Err(EngineError::BadLane { edge: stop.edge.clone(), lane: stop.lane });
        }
        let v = self.vehicle_mut(vehicle)?;
        v.stopped = stop.duration_secs > 0;
        self.stop_log.push((vehicle.clone(), stop.clone()));
        Ok(())
    }

    fn set_highlight(&mut self, vehicle: &AgentId, on: bool) -> EngineResult<()> {
        self.bump();
        self.vehicle_mut(vehicle)?.highlighted = on;
        Ok(())
    }

    fn find_path(&self, from: &EdgeId, to: &EdgeId) -> EngineResult<Vec<EdgeId>> {
        self.bump();
        if from == to {
            return Ok(vec![from.clone()]);
        }
        if let Some(path) = self.paths.get(&(from.clone(), to.clone())) {
            return Ok(path.clone());
        }
        if self.edges.contains_key(from) && self.edges.contains_key(to) {
            return Ok(vec![from.clone(), to.clone()]);
        }
        Err(EngineError::NoRoute { from: from.clone(), to: to.clone() })
    }

    fn edge_occupancy(&self, edge: &EdgeId) -> EngineResult<f64> {
        self.bump();
        Ok(self.edge(edge)?.occupancy)
    }

    fn edge_ids(&self) -> EngineResult<Vec<EdgeId>> {
        self.bump();
        Ok(self.edges.keys().cloned().collect())
    }

    fn edge_shape(&self, edge: &EdgeId) -> EngineResult<Vec<(f64, f64)>> {
        self.bump();
        Ok(self.edge(edge)?.shape.clone())
    }

    fn lane_count(&self, edge: &EdgeId) -> EngineResult<usize> {
        self.bump();
        Ok(self.edge(edge)?.lanes.len())
    }

    fn lane_allowed(&self, edge: &EdgeId, lane: usize) -> EngineResult<Vec<String>> {
        self.bump();
        let e = self.edge(edge)?;
        e.lanes
            .get(lane)
            .cloned()
            .ok_or_else(|| EngineError::BadLane { edge: edge.clone(), lane })
    }

    fn lane_length(&self, edge: &EdgeId, lane: usize) -> EngineResult<f64> {
        self.bump();
        let e = self.edge(edge)?;
        if lane >= e.lanes.len() {
            return Err(EngineError::BadLane { edge: edge.clone(), lane });
        }
        Ok(e.length_m())
    }

    fn disallow_all(&mut self, edge: &EdgeId) -> EngineResult<()> {
        self.bump();
        if !self.edges.contains_key(edge) {
            return Err(EngineError::UnknownEdge(edge.clone()));
        }
        self.disallowed.insert(edge.clone());
        Ok(())
    }

    fn allow_all(&mut self, edge: &EdgeId) -> EngineResult<()> {
        self.bump();
        if !self.edges.contains_key(edge) {
            return Err(EngineError::UnknownEdge(edge.clone()));
        }
        self.disallowed.remove(edge);
        Ok(())
    }

    fn to_geo(&self, x: f64, y: f64) -> EngineResult<GeoPoint> {
        self.bump();
        Ok(GeoPoint::new(
            self.origin.lat + y / METERS_PER_DEG,
            self.origin.lon + x / METERS_PER_DEG,
        ))
    }

    fn to_plane(&self, point: GeoPoint) -> EngineResult<(f64, f64)> {
        self.bump();
        Ok((
            (point.lon - self.origin.lon) * METERS_PER_DEG,
            (point.lat - self.origin.lat) * METERS_PER_DEG,
        ))
    }
}
