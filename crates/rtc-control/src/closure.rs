//! `ClosureManager` — road closures and their blast radius.
//!
//! Owns the closed-edge set.  The invariant maintained here is that an edge
//! is in the set iff all traffic is currently disallowed on it in the engine;
//! `close`/`reopen` are the only two operations that touch either side.

use std::collections::BTreeSet;

use log::{info, warn};

use rtc_core::geo::dist_point_to_segment;
use rtc_core::{AgentId, EdgeId};
use rtc_engine::TrafficEngine;
use rtc_plan::ItineraryCatalog;
use rtc_poi::PoiCatalog;

use crate::ControlResult;

// ── Result records ────────────────────────────────────────────────────────────

/// A substitute-destination candidate near a closed edge.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyPoi {
    pub name: String,
    pub category: String,
    pub distance_m: f64,
}

/// An agent whose chain is touched by a closure.
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedAgent {
    pub agent: AgentId,
    /// Not yet in the engine's vehicle list; its record will be adopted at
    /// spawn time instead of being pushed immediately.
    pub pending: bool,
    /// Chain stops whose POI sits on a closed edge.
    pub affected_stops: Vec<String>,
}

// ── ClosureManager ────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ClosureManager {
    closed: BTreeSet<EdgeId>,
}

impl ClosureManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed_edges(&self) -> &BTreeSet<EdgeId> {
        &self.closed
    }

    pub fn is_closed(&self, edge: &EdgeId) -> bool {
        self.closed.contains(edge)
    }

    /// Close `edges` in the engine and return the names of POIs that sit on
    /// them.  Already-closed edges are skipped silently; a per-edge engine
    /// failure is logged and skips that edge without aborting the batch.
    pub fn close<E: TrafficEngine>(
        &mut self,
        engine: &mut E,
        pois: &PoiCatalog,
        edges: &[EdgeId],
    ) -> Vec<String> {
        let mut affected = BTreeSet::new();

        for edge in edges {
            if self.closed.contains(edge) {
                continue;
            }
            if let Err(e) = engine.disallow_all(edge) {
                warn!("could not close edge {edge}: {e}");
                continue;
            }
            self.closed.insert(edge.clone());
            info!("closed edge {edge}");

            for poi in pois.on_edge(edge) {
                affected.insert(poi.name.clone());
            }
        }

        affected.into_iter().collect()
    }

    /// Reopen `edges`, or every closed edge when `None`.  Edges that are not
    /// closed are a no-op; per-edge engine failures are logged and skipped.
    pub fn reopen<E: TrafficEngine>(&mut self, engine: &mut E, edges: Option<&[EdgeId]>) {
        let targets: Vec<EdgeId> = match edges {
            Some(list) => list.iter().filter(|e| self.closed.contains(*e)).cloned().collect(),
            None => self.closed.iter().cloned().collect(),
        };

        for edge in targets {
            if let Err(e) = engine.allow_all(&edge) {
                warn!("could not reopen edge {edge}: {e}");
                continue;
            }
            self.closed.remove(&edge);
            info!("reopened edge {edge}");
        }
    }

    /// POIs near (but not on) `edge`, within `radius_m` of its shape,
    /// ascending by distance.  Distances are point-to-segment minima over
    /// the edge polyline, in the engine's planar metres.
    pub fn find_nearby_pois<E: TrafficEngine>(
        &self,
        engine: &E,
        pois: &PoiCatalog,
        edge: &EdgeId,
        radius_m: f64,
    ) -> ControlResult<Vec<NearbyPoi>> {
        let shape = engine.edge_shape(edge)?;
        let mut nearby = Vec::new();

        for poi in pois.iter() {
            if poi.edge == *edge {
                continue;
            }
            let planar = match engine.to_plane(poi.pos) {
                Ok(p) => p,
                Err(e) => {
                    warn!("could not project POI {}: {e}", poi.name);
                    continue;
                }
            };

            let distance = shape
                .windows(2)
                .map(|w| dist_point_to_segment(planar, w[0], w[1]))
                .fold(f64::INFINITY, f64::min);

            if distance <= radius_m {
                nearby.push(NearbyPoi {
                    name: poi.name.clone(),
                    category: poi.category.clone(),
                    distance_m: distance,
                });
            }
        }

        nearby.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        Ok(nearby)
    }

    /// Agents whose chain visits one of `affected_pois` or stops on a closed
    /// edge.  `live` is the engine's current vehicle set; agents outside it
    /// are flagged pending.
    pub fn find_affected_agents(
        &self,
        itineraries: &ItineraryCatalog,
        affected_pois: &[String],
        live: &BTreeSet<AgentId>,
    ) -> Vec<AffectedAgent> {
        let mut affected = Vec::new();

        for itinerary in itineraries.iter() {
            let hit_stops: Vec<String> = itinerary
                .stops
                .iter()
                .filter(|s| {
                    affected_pois.iter().any(|p| *p == s.name) || self.closed.contains(&s.edge)
                })
                .map(|s| s.name.clone())
                .collect();

            if !hit_stops.is_empty() {
                affected.push(AffectedAgent {
                    agent: itinerary.agent.clone(),
                    pending: !live.contains(&itinerary.agent),
                    affected_stops: hit_stops,
                });
            }
        }

        affected
    }
}
