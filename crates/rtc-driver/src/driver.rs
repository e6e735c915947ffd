//! The control loop.
//!
//! One `Driver` owns the engine handle and all manager state and runs the
//! WARMUP → RUNNING → STOPPED state machine.  Each RUNNING tick: step the
//! engine, adopt pending route records for newly spawned vehicles, emit a
//! telemetry snapshot, process at most one viewer command, sleep.
//!
//! Failure policy: a failed engine *step* ends the run (the engine is gone);
//! any single-vehicle query or mutation failure is logged and skipped, and
//! viewer I/O is fire-and-forget.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use rtc_control::{ClosureManager, Event, EventKind, InterestModel, RouteApplier};
use rtc_core::time::{SECS_PER_QUARTER, secs_to_hhmm, secs_to_quarter};
use rtc_core::{AgentId, EdgeId, GeoPoint};
use rtc_engine::TrafficEngine;
use rtc_llm::prompt::{event_situation, road_closure_situation};
use rtc_llm::{AdviceRequest, ChainAdvisor, TimedStop, advise_many};
use rtc_plan::{ItineraryCatalog, PlannedStop, RouteStore, lay_out_chain};
use rtc_poi::PoiCatalog;
use rtc_server::{
    Command, EdgeTraffic, Snapshot, VehicleDetail, ViewerLink, frame, frame_density, frame_error,
    parse_command, spawn_acceptor,
};

use crate::DriverResult;
use crate::config::DriverConfig;

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DriverState {
    Warmup,
    Running,
    Stopped,
}

// ── Driver ────────────────────────────────────────────────────────────────────

pub struct Driver<E: TrafficEngine, A: ChainAdvisor> {
    config: DriverConfig,
    engine: E,
    advisor: A,

    pois: PoiCatalog,
    itineraries: ItineraryCatalog,
    store: RouteStore,

    closures: ClosureManager,
    interest: InterestModel,
    applier: RouteApplier,

    link: ViewerLink,
    stop: Arc<AtomicBool>,

    state: DriverState,
    seen: BTreeSet<AgentId>,
    highlighted: Option<AgentId>,
    step: u64,
    rng: SmallRng,
}

impl<E: TrafficEngine, A: ChainAdvisor> Driver<E, A> {
    pub fn new(
        config: DriverConfig,
        engine: E,
        advisor: A,
        pois: PoiCatalog,
        itineraries: ItineraryCatalog,
        store: RouteStore,
    ) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        let applier = RouteApplier::new(config.default_stop_secs);
        Self {
            config,
            engine,
            advisor,
            pois,
            itineraries,
            store,
            closures: ClosureManager::new(),
            interest: InterestModel::new(),
            applier,
            link: ViewerLink::new(),
            stop: Arc::new(AtomicBool::new(false)),
            state: DriverState::Warmup,
            seen: BTreeSet::new(),
            highlighted: None,
            step: 0,
            rng,
        }
    }

    /// Flag checked once per tick; flip it from another thread to stop.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn closures(&self) -> &ClosureManager {
        &self.closures
    }

    pub fn store(&self) -> &RouteStore {
        &self.store
    }

    pub fn highlighted(&self) -> Option<&AgentId> {
        self.highlighted.as_ref()
    }

    pub fn viewer_link(&self) -> ViewerLink {
        self.link.clone()
    }

    // ── Run ───────────────────────────────────────────────────────────────

    /// Run to completion: accept viewers, warm up, tick until stopped.
    pub fn run(mut self) -> DriverResult<()> {
        let (acceptor, addr) =
            spawn_acceptor(&self.config.listen_addr, self.link.clone(), self.stop.clone())?;
        info!("control server on {addr}");

        self.warmup()?;

        while !self.stop.load(Ordering::Relaxed) {
            self.tick()?;
            std::thread::sleep(self.config.loop_delay);
        }

        self.shutdown();
        if acceptor.join().is_err() {
            warn!("acceptor thread panicked");
        }
        Ok(())
    }

    /// Step the engine until its clock reaches the configured start offset.
    pub fn warmup(&mut self) -> DriverResult<()> {
        while self.engine.time()? < self.config.start_offset_secs {
            self.engine.step()?;
        }
        self.state = DriverState::Running;
        info!("warmup complete at t={:.0}s", self.engine.time()?);
        Ok(())
    }

    /// One RUNNING iteration.  Public so harnesses can drive the loop by
    /// hand without sockets or sleeps.
    pub fn tick(&mut self) -> DriverResult<()> {
        self.engine.step()?;

        self.detect_spawns();

        if self.step % self.config.status_interval_steps == 0 {
            self.log_status();
        }

        if let Some(snapshot) = self.periodic_snapshot() {
            if let Ok(bytes) = frame(&snapshot) {
                self.link.send(&bytes);
            }
        }

        if let Some(raw) = self.link.try_recv() {
            match parse_command(&raw) {
                Ok(command) => self.dispatch(command),
                Err(e) => warn!("rejected command: {e}"),
            }
        }

        self.step += 1;
        Ok(())
    }

    fn shutdown(&mut self) {
        self.state = DriverState::Stopped;
        self.link.close();
        info!("driver stopped after {} steps", self.step);
    }

    // ── Tick phases ───────────────────────────────────────────────────────

    /// Diff the live vehicle set against what we have seen; newly spawned
    /// vehicles with a stored route record adopt it immediately.
    fn detect_spawns(&mut self) {
        let current: BTreeSet<AgentId> = match self.engine.vehicle_ids() {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!("could not list vehicles: {e}");
                return;
            }
        };

        for agent in current.difference(&self.seen) {
            let Some(record) = self.store.get(agent) else {
                continue;
            };
            debug!("adopting stored route for newly spawned {agent}");
            let destinations: Vec<String> =
                record.stops.iter().map(|s| s.name.clone()).collect();
            let durations: Vec<u32> = record.stops.iter().map(|s| s.duration_secs).collect();
            if let Err(e) = self.applier.apply(
                &mut self.engine,
                &self.pois,
                &self.itineraries,
                &mut self.store,
                &mut self.rng,
                agent,
                &destinations,
                &durations,
                true,
            ) {
                warn!("could not adopt stored route for {agent}: {e}");
            }
        }

        // Departed vehicles fall out so a respawned id counts as new again.
        self.seen = current;
    }

    fn log_status(&self) {
        let time = self.engine.time().unwrap_or(0.0);
        info!(
            "step {} - time {}: {} vehicles active",
            self.step,
            secs_to_hhmm(time as u32),
            self.seen.len()
        );
    }

    /// The always-sent snapshot: time, vehicle list, closed edges, and full
    /// detail plus traffic info for the highlighted vehicle only.
    fn periodic_snapshot(&self) -> Option<Snapshot> {
        let time = self.engine.time().ok()?;
        let mut snapshot = Snapshot {
            time,
            vehicles: self.seen.iter().cloned().collect(),
            closed_edges: self.closures.closed_edges().iter().cloned().collect(),
            ..Default::default()
        };

        if let Some(agent) = &self.highlighted {
            if let Some(detail) = self.highlighted_detail(agent) {
                if let Some(route) = &detail.route {
                    snapshot.traffic_info = Some(self.traffic_info(route));
                }
                snapshot.vehicle_data.insert(agent.clone(), detail);
            }
        }
        Some(snapshot)
    }

    fn highlighted_detail(&self, agent: &AgentId) -> Option<VehicleDetail> {
        let (x, y) = self.engine.position(agent).ok()?;
        let (lat, lon, alt) = self.engine.geo_position(agent).ok()?;

        let mut detail = VehicleDetail {
            position: Some([x, y]),
            lat_lon: Some([lat, lon, alt]),
            speed: self.engine.speed(agent).ok(),
            route: self.engine.route(agent).ok(),
            current_edge: self.engine.current_edge(agent).ok(),
            route_index: self.engine.route_index(agent).ok(),
            ..Default::default()
        };

        // Prefer the modified plan; fall back to the original itinerary.
        if let Some(record) = self.store.get(agent) {
            detail.route_source = Some("modified");
            detail.demographics = record
                .demographics
                .clone()
                .or_else(|| self.itineraries.demographics_of(agent).cloned());
            detail.poi_sequence = Some(record.stops.clone());
        } else if let Some(itinerary) = self.itineraries.get(agent) {
            detail.route_source = Some("original");
            detail.demographics = itinerary.demographics.clone();
            detail.poi_sequence = Some(
                itinerary
                    .stops
                    .iter()
                    .map(|s| PlannedStop {
                        name: s.name.clone(),
                        edge: s.edge.clone(),
                        order: s.order,
                        activity: s.purpose.clone(),
                        duration_secs: s.duration_secs,
                    })
                    .collect(),
            );
        }
        Some(detail)
    }

    /// Occupancy over the highlighted vehicle's route, reporting only edges
    /// above the noise floor.
    fn traffic_info(&self, route: &[EdgeId]) -> BTreeMap<EdgeId, EdgeTraffic> {
        let mut info = BTreeMap::new();
        for edge in route {
            let Ok(occupancy) = self.engine.edge_occupancy(edge) else {
                continue;
            };
            if let Some(traffic) = EdgeTraffic::from_occupancy(occupancy) {
                info.insert(edge.clone(), traffic);
            }
        }
        info
    }

    // ── Command dispatch ──────────────────────────────────────────────────

    /// Execute one parsed command.  Nothing in here may abort the tick.
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::GetVehicles => self.send_vehicle_list(),
            Command::GetPlotData => self.send_plot_data(),
            Command::GetAllVehicles => self.send_density_data(),
            Command::GetVehiclePos(agent) => self.send_vehicle_pos(&agent),
            Command::Highlight(agent) => self.highlight(agent),
            Command::ChangeRoute { agent, destinations, durations } => {
                let spawned = self.seen.contains(&agent);
                if let Err(e) = self.applier.apply(
                    &mut self.engine,
                    &self.pois,
                    &self.itineraries,
                    &mut self.store,
                    &mut self.rng,
                    &agent,
                    &destinations,
                    &durations,
                    spawned,
                ) {
                    warn!("route change for {agent} rejected: {e}");
                }
            }
            Command::CloseRoads(edges) => self.close_roads(&edges),
            Command::ReopenRoads(edges) => {
                self.closures.reopen(&mut self.engine, Some(edges.as_slice()))
            }
            Command::ReopenAllRoads => self.closures.reopen(&mut self.engine, None),
            Command::CreateEvent(body) => self.create_event(&body),
        }
    }

    fn send_vehicle_list(&self) {
        let snapshot = Snapshot {
            time: self.engine.time().unwrap_or(0.0),
            vehicles: self.seen.iter().cloned().collect(),
            closed_edges: self.closures.closed_edges().iter().cloned().collect(),
            ..Default::default()
        };
        if let Ok(bytes) = frame(&snapshot) {
            self.link.send(&bytes);
        }
    }

    fn send_plot_data(&self) {
        let mut snapshot = Snapshot {
            time: self.engine.time().unwrap_or(0.0),
            vehicles: self.seen.iter().cloned().collect(),
            closed_edges: self.closures.closed_edges().iter().cloned().collect(),
            ..Default::default()
        };
        for agent in &self.seen {
            let Ok((x, y)) = self.engine.position(agent) else {
                continue;
            };
            let lat_lon = self.engine.geo_position(agent).ok().map(|(a, b, c)| [a, b, c]);
            snapshot.vehicle_data.insert(
                agent.clone(),
                VehicleDetail { position: Some([x, y]), lat_lon, ..Default::default() },
            );
        }
        if let Ok(bytes) = frame(&snapshot) {
            self.link.send(&bytes);
        }
    }

    fn send_density_data(&self) {
        let mut snapshot = Snapshot {
            time: self.engine.time().unwrap_or(0.0),
            vehicles: self.seen.iter().cloned().collect(),
            closed_edges: self.closures.closed_edges().iter().cloned().collect(),
            message_type: Some("density_data"),
            ..Default::default()
        };
        for agent in &self.seen {
            let Ok((x, y)) = self.engine.position(agent) else {
                continue;
            };
            snapshot
                .vehicle_data
                .insert(agent.clone(), VehicleDetail { position: Some([x, y]), ..Default::default() });
        }
        snapshot.vehicle_count = Some(snapshot.vehicle_data.len());
        if let Ok(bytes) = frame_density(&snapshot) {
            self.link.send(&bytes);
        }
    }

    fn send_vehicle_pos(&self, agent: &AgentId) {
        let bytes = match self.engine.position(agent) {
            Ok((x, y)) => {
                let detail = VehicleDetail { position: Some([x, y]), ..Default::default() };
                match frame(&detail) {
                    Ok(b) => b,
                    Err(_) => return,
                }
            }
            Err(e) => frame_error(&e.to_string()),
        };
        self.link.send(&bytes);
    }

    /// Track one vehicle; the previous one loses its visual state.  An
    /// unknown id still resets the old highlight and leaves none.
    fn highlight(&mut self, agent: AgentId) {
        if let Some(previous) = self.highlighted.take() {
            if let Err(e) = self.engine.set_highlight(&previous, false) {
                debug!("could not reset highlight on {previous}: {e}");
            }
        }
        if self.seen.contains(&agent) {
            match self.engine.set_highlight(&agent, true) {
                Ok(()) => {
                    info!("highlighting {agent}");
                    self.highlighted = Some(agent);
                }
                Err(e) => warn!("could not highlight {agent}: {e}"),
            }
        } else {
            warn!("highlight requested for unknown vehicle {agent}");
        }
    }

    // ── Closure and event pipelines ───────────────────────────────────────

    fn close_roads(&mut self, edges: &[EdgeId]) {
        let affected_pois = self.closures.close(&mut self.engine, &self.pois, edges);
        if affected_pois.is_empty() {
            return;
        }
        info!("closure affects POIs: {affected_pois:?}");

        // Up to N substitute destinations per closed edge, for the prompt.
        let mut alternatives = Vec::new();
        for edge in edges {
            let Ok(nearby) =
                self.closures
                    .find_nearby_pois(&self.engine, &self.pois, edge, self.config.nearby_radius_m)
            else {
                continue;
            };
            let listed: Vec<String> = nearby
                .iter()
                .take(self.config.nearby_suggestions)
                .map(|p| format!("{} ({}, {:.0}m away)", p.name, p.category, p.distance_m))
                .collect();
            if !listed.is_empty() {
                alternatives.push(format!("Near {edge}: {}", listed.join(", ")));
            }
        }

        let situation = road_closure_situation(edges, &affected_pois, &alternatives.join(" "));
        let affected =
            self.closures
                .find_affected_agents(&self.itineraries, &affected_pois, &self.seen);
        info!("{} agents affected by closure", affected.len());

        let requests: Vec<AdviceRequest> = affected
            .iter()
            .map(|a| self.advice_request(&a.agent, &situation))
            .collect();
        self.advise_and_apply(&requests);
    }

    fn create_event(&mut self, body: &str) {
        let event = match Event::from_json(body) {
            Ok(event) => event,
            Err(e) => {
                warn!("ignoring event: {e}");
                return;
            }
        };

        let candidates: Vec<_> = self
            .itineraries
            .iter()
            .filter_map(|it| it.demographics.clone().map(|d| (it.agent.clone(), d)))
            .collect();
        let selected = self.interest.select(&candidates, event.kind, event.capacity);
        info!(
            "event {:?} at {} selected {} of {} candidate agents",
            event.name,
            event.location,
            selected.len(),
            candidates.len()
        );

        let window = event.window();
        let kind = match event.kind {
            EventKind::Sports => "sports",
            EventKind::Entertainment => "entertainment",
        };
        let situation = event_situation(
            kind,
            &event.name,
            &event.location,
            &secs_to_hhmm(window.start_quarter * SECS_PER_QUARTER),
            window.duration_quarters / 4,
        );

        let requests: Vec<AdviceRequest> = selected
            .iter()
            .map(|agent| self.advice_request(agent, &situation))
            .collect();
        self.advise_and_apply(&requests);
    }

    fn advice_request(&self, agent: &AgentId, situation: &str) -> AdviceRequest {
        let chain = self.current_chain(agent);
        let location = self.agent_location(agent, &chain);
        AdviceRequest {
            agent: agent.clone(),
            chain,
            location,
            demographics: self.itineraries.demographics_of(agent).cloned(),
            traffic: String::new(),
            situation: situation.to_string(),
        }
    }

    /// The chain the agent is actually following.  A stored modification has
    /// durations but no times; its timing is laid out afresh from the current
    /// clock.  Otherwise the original itinerary timing stands.
    fn current_chain(&self, agent: &AgentId) -> Vec<TimedStop> {
        if let Some(record) = self.store.get(agent) {
            let pairs: Vec<(String, u32)> = record
                .stops
                .iter()
                .map(|s| (s.name.clone(), (s.duration_secs / SECS_PER_QUARTER).max(1)))
                .collect();
            let now = secs_to_quarter(self.engine.time().unwrap_or(0.0) as u32);
            return lay_out_chain(&pairs, now)
                .into_iter()
                .map(|(name, start_secs, duration_secs)| TimedStop {
                    name,
                    start_quarter: start_secs / SECS_PER_QUARTER,
                    duration_quarters: duration_secs / SECS_PER_QUARTER,
                })
                .collect();
        }
        self.itineraries
            .chain_of(agent)
            .iter()
            .map(|entry| TimedStop {
                name: entry.name.clone(),
                start_quarter: entry.start_secs / SECS_PER_QUARTER,
                duration_quarters: entry.duration_quarters(),
            })
            .collect()
    }

    /// Where the agent is right now, as a POI name: nearest catalog entry to
    /// the live position for spawned vehicles, else the first chain stop.
    fn agent_location(&self, agent: &AgentId, chain: &[TimedStop]) -> String {
        if self.seen.contains(agent) {
            if let Ok((lat, lon, _)) = self.engine.geo_position(agent) {
                if let Some(poi) = self.pois.nearest(GeoPoint::new(lat, lon)) {
                    return poi.name.clone();
                }
            }
        }
        chain
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Fan requests through the advisor pool and apply every accepted chain.
    fn advise_and_apply(&mut self, requests: &[AdviceRequest]) {
        if requests.is_empty() {
            return;
        }
        let outcome = advise_many(&self.advisor, requests, self.config.llm_workers, &|name| {
            self.pois.contains(name)
        });

        for (agent, (destinations, durations)) in outcome {
            let spawned = self.seen.contains(&agent);
            if let Err(e) = self.applier.apply(
                &mut self.engine,
                &self.pois,
                &self.itineraries,
                &mut self.store,
                &mut self.rng,
                &agent,
                &destinations,
                &durations,
                spawned,
            ) {
                warn!("could not apply advised chain for {agent}: {e}");
            }
        }
    }
}
