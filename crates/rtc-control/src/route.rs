//! `RouteApplier` — turns an ordered destination list into an engine-valid
//! route plus stop sequence.
//!
//! Two cases, split on whether the vehicle exists in the engine yet:
//!
//! * **Spawned** — read the live route, preserve it up to the stop the
//!   vehicle is already heading for, rebuild everything after through
//!   shortest-path queries, push the result, and re-issue parking stops.
//! * **Pending** — persist the stop chain with the stop-edge list standing
//!   in for the route, touching the engine not at all; the driver re-applies
//!   the record the moment the vehicle spawns.
//!
//! Either way the accepted chain lands in the route store keyed by agent id,
//! replacing any earlier record for that agent.

use log::{info, warn};
use rand::Rng;
use rand::rngs::SmallRng;

use rtc_core::{AgentId, EdgeId};
use rtc_engine::{PASSENGER_CLASS, StopParams, TrafficEngine};
use rtc_plan::{ItineraryCatalog, ModifiedRouteRecord, PlannedStop, RouteStore};
use rtc_poi::PoiCatalog;

use crate::{ControlError, ControlResult};

/// Dwell time used when a stop arrives without a duration.
pub const DEFAULT_STOP_SECS: u32 = 900;

// ── RouteApplier ──────────────────────────────────────────────────────────────

pub struct RouteApplier {
    pub default_stop_secs: u32,
}

impl Default for RouteApplier {
    fn default() -> Self {
        Self { default_stop_secs: DEFAULT_STOP_SECS }
    }
}

struct ResolvedStop {
    name: String,
    edge: EdgeId,
    category: String,
    duration_secs: u32,
}

impl RouteApplier {
    pub fn new(default_stop_secs: u32) -> Self {
        Self { default_stop_secs }
    }

    /// Apply a destination-list modification to `agent`.
    ///
    /// `durations` pairs with `destinations` by index; missing entries fall
    /// back to [`default_stop_secs`][Self::default_stop_secs].  `spawned`
    /// reflects the driver's seen-vehicle set.  A destination name unknown
    /// to the POI catalog aborts the whole request with no state change.
    #[allow(clippy::too_many_arguments)]
    pub fn apply<E: TrafficEngine>(
        &self,
        engine: &mut E,
        pois: &PoiCatalog,
        itineraries: &ItineraryCatalog,
        store: &mut RouteStore,
        rng: &mut SmallRng,
        agent: &AgentId,
        destinations: &[String],
        durations: &[u32],
        spawned: bool,
    ) -> ControlResult<()> {
        if destinations.is_empty() {
            return Err(ControlError::EmptyChain);
        }

        let stops: Vec<ResolvedStop> = destinations
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let poi = pois
                    .get(name)
                    .ok_or_else(|| ControlError::UnknownPoi(name.clone()))?;
                Ok(ResolvedStop {
                    name: poi.name.clone(),
                    edge: poi.edge.clone(),
                    category: poi.category.clone(),
                    duration_secs: durations.get(i).copied().unwrap_or(self.default_stop_secs),
                })
            })
            .collect::<ControlResult<_>>()?;

        if spawned {
            self.apply_spawned(engine, itineraries, store, rng, agent, &stops)
        } else {
            // Stop edges stand in for the route until the vehicle exists.
            let placeholder: Vec<EdgeId> = stops.iter().map(|s| s.edge.clone()).collect();
            persist(store, itineraries, agent, &stops, placeholder)?;
            info!("stored pending route modification for {agent}");
            Ok(())
        }
    }

    fn apply_spawned<E: TrafficEngine>(
        &self,
        engine: &mut E,
        itineraries: &ItineraryCatalog,
        store: &mut RouteStore,
        rng: &mut SmallRng,
        agent: &AgentId,
        stops: &[ResolvedStop],
    ) -> ControlResult<()> {
        let stop_edges: Vec<EdgeId> = stops.iter().map(|s| s.edge.clone()).collect();

        let mut current_edge = engine.current_edge(agent)?;
        let route = engine.route(agent)?;
        let index = engine.route_index(agent)?.min(route.len().saturating_sub(1));

        // A vehicle inside a junction counts as being on the next real edge.
        if current_edge.is_internal() && index + 1 < route.len() {
            current_edge = route[index + 1].clone();
        }

        // The stop the vehicle is already driving towards, if any of the
        // requested edges still lies ahead on its current route.
        let current_destination = route
            .iter()
            .skip(index)
            .find(|e| stop_edges.contains(e))
            .cloned();

        let mut complete: Vec<EdgeId>;
        let first_pending_stop;

        match &current_destination {
            Some(dest) => {
                // Keep the driven prefix, rebuild only past the destination.
                let dest_index = stop_edges.iter().position(|e| e == dest).unwrap_or(0);
                first_pending_stop = dest_index;
                complete = route[..=index].to_vec();
                for pair in stop_edges[dest_index..].windows(2) {
                    append_leg(engine, &mut complete, &pair[0], &pair[1]);
                }
            }
            None => {
                // Nothing requested lies ahead; rebuild from where we are.
                first_pending_stop = 0;
                complete = Vec::new();
                if !current_edge.is_internal() {
                    complete.push(current_edge.clone());
                }
                append_leg(engine, &mut complete, &current_edge, &stop_edges[0]);
                for pair in stop_edges.windows(2) {
                    append_leg(engine, &mut complete, &pair[0], &pair[1]);
                }
            }
        }

        if complete.is_empty() {
            return Err(ControlError::RouteAssembly(agent.clone()));
        }

        // Single-edge placeholder first: clears stops incompatible with the
        // new route before the full route lands.
        engine.set_route(agent, std::slice::from_ref(&current_edge))?;
        engine.set_route(agent, &complete)?;

        match engine.is_stopped(agent) {
            Ok(true) => {
                let clear = StopParams {
                    edge: complete[0].clone(),
                    pos_m: 0.0,
                    lane: 0,
                    duration_secs: 0,
                    parking: false,
                };
                if let Err(e) = engine.set_stop(agent, &clear) {
                    warn!("could not clear active stop for {agent}: {e}");
                }
            }
            Ok(false) => {}
            Err(e) => warn!("could not query stop state for {agent}: {e}"),
        }

        for stop in &stops[first_pending_stop..] {
            self.place_stop(engine, rng, agent, stop);
        }

        persist(store, itineraries, agent, stops, complete)?;
        info!("updated route for {agent} ({} stops)", stops.len() - first_pending_stop);
        Ok(())
    }

    /// Issue one parking stop, choosing the first lane that permits it and a
    /// position sampled along that lane.  Failures are logged and skipped.
    fn place_stop<E: TrafficEngine>(
        &self,
        engine: &mut E,
        rng: &mut SmallRng,
        agent: &AgentId,
        stop: &ResolvedStop,
    ) {
        let Some(lane) = choose_stop_lane(engine, &stop.edge) else {
            warn!("no lane allows stopping on edge {}", stop.edge);
            return;
        };
        let length = match engine.lane_length(&stop.edge, lane) {
            Ok(l) => l,
            Err(e) => {
                warn!("could not measure lane {lane} of {}: {e}", stop.edge);
                return;
            }
        };
        let params = StopParams {
            edge: stop.edge.clone(),
            pos_m: length * rng.r#gen::<f64>(),
            lane,
            duration_secs: stop.duration_secs,
            parking: true,
        };
        if let Err(e) = engine.set_stop(agent, &params) {
            warn!("could not set stop at {} for {agent}: {e}", stop.edge);
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Append the shortest path `from → to` to `complete`, splicing in a
/// connecting path when the accumulated route does not end where the leg
/// starts.  A leg the engine cannot route is logged and skipped.
fn append_leg<E: TrafficEngine>(
    engine: &E,
    complete: &mut Vec<EdgeId>,
    from: &EdgeId,
    to: &EdgeId,
) {
    let leg = match engine.find_path(from, to) {
        Ok(leg) if !leg.is_empty() => leg,
        Ok(_) => return,
        Err(e) => {
            warn!("no path {from} -> {to}: {e}");
            return;
        }
    };

    match complete.last() {
        None => complete.extend(leg),
        Some(last) if *last == leg[0] => complete.extend(leg.into_iter().skip(1)),
        Some(last) => match engine.find_path(last, &leg[0]) {
            Ok(connecting) => {
                complete.extend(connecting.into_iter().skip(1));
                complete.extend(leg.into_iter().skip(1));
            }
            Err(e) => {
                warn!("no connecting path {last} -> {}: {e}", leg[0]);
                complete.extend(leg);
            }
        },
    }
}

/// First lane on `edge` that is unrestricted or allows the passenger class.
fn choose_stop_lane<E: TrafficEngine>(engine: &E, edge: &EdgeId) -> Option<usize> {
    let count = engine.lane_count(edge).ok()?;
    (0..count).find(|&lane| {
        engine
            .lane_allowed(edge, lane)
            .map(|allowed| allowed.is_empty() || allowed.iter().any(|c| c == PASSENGER_CLASS))
            .unwrap_or(false)
    })
}

fn persist(
    store: &mut RouteStore,
    itineraries: &ItineraryCatalog,
    agent: &AgentId,
    stops: &[ResolvedStop],
    route: Vec<EdgeId>,
) -> ControlResult<()> {
    let record = ModifiedRouteRecord {
        agent: agent.clone(),
        stops: stops
            .iter()
            .enumerate()
            .map(|(i, s)| PlannedStop {
                name: s.name.clone(),
                edge: s.edge.clone(),
                order: i as u32,
                activity: s.category.clone(),
                duration_secs: s.duration_secs,
            })
            .collect(),
        route,
        demographics: itineraries.demographics_of(agent).cloned(),
    };
    store.insert(record)?;
    Ok(())
}
