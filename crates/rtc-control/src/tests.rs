//! Unit tests for the closure manager, interest model, and route applier.

use std::collections::BTreeSet;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use rtc_core::{AgentId, EdgeId, GeoPoint};
use rtc_engine::MockEngine;
use rtc_plan::{
    ChainEntry, Demographics, Gender, IncomeLevel, Itinerary, ItineraryCatalog, RouteStore,
};
use rtc_poi::{Poi, PoiCatalog};

use crate::{ClosureManager, ControlError, Event, EventKind, InterestModel, RouteApplier};

// ── Fixtures ──────────────────────────────────────────────────────────────────

const METERS_PER_DEG: f64 = 111_320.0;

/// Geographic point at a planar offset from the mock engine's origin.
fn geo(x_m: f64, y_m: f64) -> GeoPoint {
    GeoPoint::new(34.0689 + y_m / METERS_PER_DEG, -118.4452 + x_m / METERS_PER_DEG)
}

fn poi(id: &str, name: &str, pos: GeoPoint, category: &str, edge: &str) -> Poi {
    Poi {
        id: id.into(),
        name: name.to_string(),
        pos,
        category: category.to_string(),
        edge: EdgeId::new(edge),
    }
}

fn demo(age: u32, gender: Gender, income: IncomeLevel) -> Demographics {
    Demographics { age, gender, income }
}

fn rng() -> SmallRng {
    SmallRng::seed_from_u64(7)
}

/// Grid network: `x` is the edge under closure, e1..e3 host the POIs.
fn network() -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .add_edge("x", vec![(0.0, 0.0), (100.0, 0.0)])
        .add_edge("e0", vec![(0.0, -50.0), (100.0, -50.0)])
        .add_edge("e1", vec![(0.0, 30.0), (100.0, 30.0)])
        .add_edge("e2", vec![(0.0, 100.0), (100.0, 100.0)])
        .add_edge("e3", vec![(0.0, 800.0), (100.0, 800.0)]);
    engine
}

fn catalog() -> PoiCatalog {
    PoiCatalog::from_pois(vec![
        poi("p0", "Cafe A", geo(50.0, 0.0), "cafe", "x"),
        poi("p1", "Deli", geo(50.0, 30.0), "restaurant", "e1"),
        poi("p2", "Cafe B", geo(50.0, 100.0), "cafe", "e2"),
        poi("p3", "Ralphs", geo(50.0, 800.0), "supermarket", "e3"),
    ])
}

fn itineraries() -> ItineraryCatalog {
    let stop = |name: &str, edge: &str, order: u32| ChainEntry {
        name: name.to_string(),
        edge: EdgeId::new(edge),
        order,
        purpose: "cafe".to_string(),
        start_secs: order * 3_600,
        duration_secs: 3_600,
    };
    ItineraryCatalog::from_itineraries(vec![
        Itinerary {
            agent: AgentId::new("agent_1"),
            demographics: Some(demo(34, Gender::Female, IncomeLevel::Medium)),
            stops: vec![stop("Cafe A", "x", 0), stop("Ralphs", "e3", 1)],
        },
        Itinerary {
            agent: AgentId::new("agent_2"),
            demographics: Some(demo(25, Gender::Male, IncomeLevel::High)),
            stops: vec![stop("Deli", "e1", 0)],
        },
    ])
}

#[cfg(test)]
mod closures {
    use super::*;

    #[test]
    fn closed_set_mirrors_engine_disallowed_set() {
        let mut engine = network();
        let mut manager = ClosureManager::new();
        let pois = catalog();

        manager.close(&mut engine, &pois, &[EdgeId::new("x"), EdgeId::new("e1")]);
        assert_eq!(manager.closed_edges(), engine.disallowed_edges());

        manager.reopen(&mut engine, Some(&[EdgeId::new("x")]));
        assert_eq!(manager.closed_edges(), engine.disallowed_edges());
        assert!(manager.is_closed(&EdgeId::new("e1")));
        assert!(!manager.is_closed(&EdgeId::new("x")));
    }

    #[test]
    fn close_is_idempotent() {
        let mut engine = network();
        let mut manager = ClosureManager::new();
        let pois = catalog();

        let first = manager.close(&mut engine, &pois, &[EdgeId::new("x")]);
        assert_eq!(first, vec!["Cafe A".to_string()]);

        let second = manager.close(&mut engine, &pois, &[EdgeId::new("x")]);
        assert!(second.is_empty());
        assert_eq!(manager.closed_edges().len(), 1);
        assert_eq!(engine.disallowed_edges().len(), 1);
    }

    #[test]
    fn unknown_edge_is_skipped_without_aborting_the_batch() {
        let mut engine = network();
        let mut manager = ClosureManager::new();
        let pois = catalog();

        manager.close(
            &mut engine,
            &pois,
            &[EdgeId::new("nowhere"), EdgeId::new("e1")],
        );
        assert!(manager.is_closed(&EdgeId::new("e1")));
        assert!(!manager.is_closed(&EdgeId::new("nowhere")));
    }

    #[test]
    fn reopen_none_clears_everything() {
        let mut engine = network();
        let mut manager = ClosureManager::new();
        let pois = catalog();

        manager.close(
            &mut engine,
            &pois,
            &[EdgeId::new("x"), EdgeId::new("e1"), EdgeId::new("e2")],
        );
        manager.reopen(&mut engine, None);

        assert!(manager.closed_edges().is_empty());
        assert!(engine.disallowed_edges().is_empty());
    }

    #[test]
    fn nearby_pois_exclude_on_edge_and_sort_ascending() {
        let engine = network();
        let manager = ClosureManager::new();
        let pois = catalog();

        let nearby = manager
            .find_nearby_pois(&engine, &pois, &EdgeId::new("x"), 500.0)
            .unwrap();

        // Cafe A is on the edge itself; Ralphs is 800 m out.
        let names: Vec<_> = nearby.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Deli", "Cafe B"]);
        assert!(nearby[0].distance_m < nearby[1].distance_m);
        assert!((nearby[0].distance_m - 30.0).abs() < 1.0);
    }

    #[test]
    fn affected_agents_flag_pending_when_not_live() {
        let mut engine = network();
        let mut manager = ClosureManager::new();
        let pois = catalog();

        let affected_pois = manager.close(&mut engine, &pois, &[EdgeId::new("x")]);
        let live: BTreeSet<AgentId> = [AgentId::new("agent_1")].into();

        let affected = manager.find_affected_agents(&itineraries(), &affected_pois, &live);
        assert_eq!(affected.len(), 1);
        assert_eq!(affected[0].agent, AgentId::new("agent_1"));
        assert!(!affected[0].pending);
        assert_eq!(affected[0].affected_stops, vec!["Cafe A".to_string()]);

        // Same closure with nobody spawned yet: the agent is pending.
        let affected = manager.find_affected_agents(&itineraries(), &affected_pois, &BTreeSet::new());
        assert!(affected[0].pending);
    }
}

#[cfg(test)]
mod events {
    use super::*;

    #[test]
    fn capacity_selection_is_descending_and_bounded() {
        let model = InterestModel::new();
        // Entertainment scores: 0.97, 0.81, 0.72 respectively.
        let agents = vec![
            (AgentId::new("kid"), demo(10, Gender::Unspecified, IncomeLevel::Low)),
            (AgentId::new("rich_adult"), demo(25, Gender::Female, IncomeLevel::High)),
            (AgentId::new("adult"), demo(25, Gender::Female, IncomeLevel::Low)),
        ];

        let picked = model.select(&agents, EventKind::Entertainment, 2);
        assert_eq!(
            picked,
            vec![AgentId::new("rich_adult"), AgentId::new("adult")]
        );
    }

    #[test]
    fn ties_keep_input_order() {
        let model = InterestModel::new();
        let twin = demo(25, Gender::Female, IncomeLevel::Low);
        let agents = vec![
            (AgentId::new("first"), twin.clone()),
            (AgentId::new("second"), twin),
        ];
        let picked = model.select(&agents, EventKind::Entertainment, 2);
        assert_eq!(picked, vec![AgentId::new("first"), AgentId::new("second")]);
    }

    #[test]
    fn sports_score_uses_age_band_and_gender() {
        let model = InterestModel::new();
        let s = model.demographic_score(&demo(25, Gender::Male, IncomeLevel::Low), EventKind::Sports);
        assert!((s - 0.7 * 1.002 * 1.002).abs() < 1e-12);

        let child = model.demographic_score(&demo(10, Gender::Male, IncomeLevel::Low), EventKind::Sports);
        assert!((child - 0.7 * 0.5 * 1.002).abs() < 1e-12);
    }

    #[test]
    fn distance_factor_has_exactly_two_tiers() {
        assert_eq!(InterestModel::distance_factor(0.0), 1.005);
        assert_eq!(InterestModel::distance_factor(20.0), 1.005);
        assert_eq!(InterestModel::distance_factor(20.1), 0.995);
    }

    #[test]
    fn interest_score_applies_distance_on_top_of_demographics() {
        let model = InterestModel::new();
        let event = Event::from_json(
            r#"{ "type": "sports", "name": "Game", "location": "Stadium",
                 "lat": 34.0703, "lon": -118.4468, "capacity": 10 }"#,
        )
        .unwrap();
        let d = demo(25, Gender::Male, IncomeLevel::Low);
        let base = model.demographic_score(&d, EventKind::Sports);
        let near = model.interest_score(&d, GeoPoint::new(34.07, -118.44), &event);
        assert!((near - base * 1.005).abs() < 1e-12);
    }

    #[test]
    fn event_window_defaults_to_noon_two_hours() {
        let event = Event::from_json(
            r#"{ "type": "entertainment", "name": "Show", "location": "Theater",
                 "lat": 34.06, "lon": -118.44, "capacity": 5 }"#,
        )
        .unwrap();
        let window = event.window();
        assert_eq!(window.start_quarter, 48);
        assert_eq!(window.duration_quarters, 8);

        let timed = Event::from_json(
            r#"{ "type": "entertainment", "name": "Show", "location": "Theater",
                 "lat": 34.06, "lon": -118.44, "start_time": "19:00",
                 "duration": 3, "capacity": 5 }"#,
        )
        .unwrap();
        assert_eq!(timed.window().start_quarter, 76);
        assert_eq!(timed.window().duration_quarters, 12);
    }

    #[test]
    fn malformed_event_body_is_rejected() {
        assert!(matches!(
            Event::from_json("not json"),
            Err(ControlError::BadEvent(_))
        ));
    }
}

#[cfg(test)]
mod route_applier {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Edge-id positions within a route, for in-order subsequence checks.
    fn position(route: &[EdgeId], edge: &str) -> usize {
        route.iter().position(|e| e == &EdgeId::new(edge)).unwrap()
    }

    #[test]
    fn pending_agent_is_persisted_without_engine_calls() {
        let mut engine = network();
        let applier = RouteApplier::default();
        let pois = catalog();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();

        let before = engine.rpc_calls();
        applier
            .apply(
                &mut engine,
                &pois,
                &its,
                &mut store,
                &mut rng,
                &AgentId::new("agent_7"),
                &strings(&["Cafe B", "Ralphs"]),
                &[600, 1200],
                false,
            )
            .unwrap();

        assert_eq!(engine.rpc_calls(), before);
        let record = store.get(&AgentId::new("agent_7")).unwrap();
        assert_eq!(record.stops.len(), 2);
        assert_eq!(record.stops[0].duration_secs, 600);
        assert_eq!(record.stops[1].duration_secs, 1200);
        assert_eq!(record.route, vec![EdgeId::new("e2"), EdgeId::new("e3")]);
    }

    #[test]
    fn second_modification_overwrites_the_first() {
        let mut engine = network();
        let applier = RouteApplier::default();
        let pois = catalog();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();
        let agent = AgentId::new("agent_7");

        for stops in [&["Cafe B"][..], &["Deli", "Ralphs"][..]] {
            applier
                .apply(&mut engine, &pois, &its, &mut store, &mut rng, &agent, &strings(stops), &[], false)
                .unwrap();
        }

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&agent).unwrap().stops.len(), 2);
    }

    #[test]
    fn unknown_poi_aborts_with_no_state_change() {
        let mut engine = network();
        let applier = RouteApplier::default();
        let pois = catalog();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();

        let err = applier
            .apply(
                &mut engine,
                &pois,
                &its,
                &mut store,
                &mut rng,
                &AgentId::new("agent_1"),
                &strings(&["Cafe B", "Atlantis"]),
                &[],
                false,
            )
            .unwrap_err();

        assert!(matches!(err, ControlError::UnknownPoi(name) if name == "Atlantis"));
        assert!(store.is_empty());
        assert!(engine.route_log.is_empty());
    }

    #[test]
    fn spawned_route_starts_at_current_edge_with_stops_in_order() {
        let mut engine = network();
        engine.add_vehicle("agent_1", vec![EdgeId::new("e0")]);
        let applier = RouteApplier::default();
        let pois = catalog();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();
        let agent = AgentId::new("agent_1");

        applier
            .apply(
                &mut engine,
                &pois,
                &its,
                &mut store,
                &mut rng,
                &agent,
                &strings(&["Deli", "Cafe B", "Ralphs"]),
                &[],
                true,
            )
            .unwrap();

        // Placeholder single-edge route first, then the full rebuild.
        assert_eq!(engine.route_log.len(), 2);
        assert_eq!(engine.route_log[0].1, vec![EdgeId::new("e0")]);

        let route = &engine.route_log[1].1;
        assert_eq!(route[0], EdgeId::new("e0"));
        let (a, b, c) = (position(route, "e1"), position(route, "e2"), position(route, "e3"));
        assert!(a < b && b < c);

        // One parking stop per destination, default duration.
        assert_eq!(engine.stop_log.len(), 3);
        for (_, stop) in &engine.stop_log {
            assert!(stop.parking);
            assert_eq!(stop.duration_secs, 900);
        }

        // Persisted record carries the concrete merged route.
        assert_eq!(store.get(&agent).unwrap().route, *route);
    }

    #[test]
    fn driven_prefix_is_preserved_when_destination_lies_ahead() {
        let mut engine = network();
        engine.script_path("e0", "e2", vec![EdgeId::new("e0"), EdgeId::new("e1"), EdgeId::new("e2")]);
        engine.add_vehicle(
            "agent_1",
            vec![EdgeId::new("e0"), EdgeId::new("e1"), EdgeId::new("e2")],
        );
        let agent = AgentId::new("agent_1");
        engine.advance_vehicle(&agent, 1);

        let applier = RouteApplier::default();
        let pois = catalog();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();

        // Cafe B (e2) is already ahead on the route: keep e0..e1, rebuild after.
        applier
            .apply(
                &mut engine,
                &pois,
                &its,
                &mut store,
                &mut rng,
                &agent,
                &strings(&["Cafe B", "Ralphs"]),
                &[300, 600],
                true,
            )
            .unwrap();

        let route = &engine.route_log.last().unwrap().1;
        assert_eq!(&route[..2], &[EdgeId::new("e0"), EdgeId::new("e1")]);
        assert!(position(route, "e2") < position(route, "e3"));
        // Both stops are re-issued with their requested durations.
        let durations: Vec<u32> = engine.stop_log.iter().map(|(_, s)| s.duration_secs).collect();
        assert_eq!(durations, vec![300, 600]);
    }

    #[test]
    fn stop_lane_skips_lanes_that_bar_passenger_cars() {
        let mut engine = MockEngine::new();
        engine
            .add_edge("e0", vec![(0.0, 0.0), (50.0, 0.0)])
            .add_edge_with_lanes(
                "bus_street",
                vec![(0.0, 10.0), (50.0, 10.0)],
                vec![vec!["bus".to_string()], vec!["passenger".to_string()]],
            );
        engine.add_vehicle("agent_1", vec![EdgeId::new("e0")]);

        let pois = PoiCatalog::from_pois(vec![poi(
            "p9",
            "Depot Cafe",
            geo(25.0, 10.0),
            "cafe",
            "bus_street",
        )]);
        let applier = RouteApplier::default();
        let its = itineraries();
        let mut store = RouteStore::in_memory();
        let mut rng = rng();

        applier
            .apply(
                &mut engine,
                &pois,
                &its,
                &mut store,
                &mut rng,
                &AgentId::new("agent_1"),
                &strings(&["Depot Cafe"]),
                &[],
                true,
            )
            .unwrap();

        let (_, stop) = engine.stop_log.last().unwrap();
        assert_eq!(stop.lane, 1);
        assert!(stop.pos_m >= 0.0 && stop.pos_m <= 50.0);
    }
}
