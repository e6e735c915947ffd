//! Unit tests for rtc-engine (exercised through MockEngine).

use rtc_core::{AgentId, EdgeId, GeoPoint};

use crate::traits::{StopParams, TrafficEngine};
use crate::{EngineError, MockEngine};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn two_edge_engine() -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .add_edge("e1", vec![(0.0, 0.0), (100.0, 0.0)])
        .add_edge("e2", vec![(100.0, 0.0), (200.0, 0.0)]);
    engine
}

#[cfg(test)]
mod spawning {
    use super::*;

    #[test]
    fn scheduled_vehicle_appears_after_spawn_time() {
        let mut engine = two_edge_engine();
        engine.schedule_spawn("agent_1", 2.5, vec![EdgeId::new("e1"), EdgeId::new("e2")]);

        assert!(engine.vehicle_ids().unwrap().is_empty());
        engine.step().unwrap(); // t = 1
        engine.step().unwrap(); // t = 2
        assert!(engine.vehicle_ids().unwrap().is_empty());
        engine.step().unwrap(); // t = 3 ≥ 2.5
        assert_eq!(engine.vehicle_ids().unwrap(), vec![AgentId::new("agent_1")]);
    }

    #[test]
    fn unknown_vehicle_query_errors() {
        let engine = two_edge_engine();
        let err = engine.speed(&AgentId::new("ghost")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownVehicle(_)));
    }
}

#[cfg(test)]
mod routing {
    use super::*;

    #[test]
    fn scripted_path_wins_over_fallback() {
        let mut engine = two_edge_engine();
        engine.add_edge("mid", vec![(50.0, 0.0), (60.0, 0.0)]);
        engine.script_path(
            "e1",
            "e2",
            vec![EdgeId::new("e1"), EdgeId::new("mid"), EdgeId::new("e2")],
        );
        let path = engine.find_path(&EdgeId::new("e1"), &EdgeId::new("e2")).unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path[1], EdgeId::new("mid"));
    }

    #[test]
    fn same_edge_path_is_single_edge() {
        let engine = two_edge_engine();
        let path = engine.find_path(&EdgeId::new("e1"), &EdgeId::new("e1")).unwrap();
        assert_eq!(path, vec![EdgeId::new("e1")]);
    }

    #[test]
    fn unknown_edge_has_no_route() {
        let engine = two_edge_engine();
        let err = engine
            .find_path(&EdgeId::new("e1"), &EdgeId::new("nowhere"))
            .unwrap_err();
        assert!(matches!(err, EngineError::NoRoute { .. }));
    }
}

#[cfg(test)]
mod mutations {
    use super::*;

    #[test]
    fn disallow_and_allow_track_edges() {
        let mut engine = two_edge_engine();
        let e1 = EdgeId::new("e1");
        engine.disallow_all(&e1).unwrap();
        assert!(engine.disallowed_edges().contains(&e1));
        engine.allow_all(&e1).unwrap();
        assert!(engine.disallowed_edges().is_empty());
    }

    #[test]
    fn set_stop_validates_lane() {
        let mut engine = two_edge_engine();
        engine.add_vehicle("agent_1", vec![EdgeId::new("e1")]);
        let bad = StopParams {
            edge: EdgeId::new("e1"),
            pos_m: 10.0,
            lane: 3,
            duration_secs: 900,
            parking: true,
        };
        assert!(matches!(
            engine.set_stop(&AgentId::new("agent_1"), &bad).unwrap_err(),
            EngineError::BadLane { .. }
        ));
    }

    #[test]
    fn set_route_resets_route_index() {
        let mut engine = two_edge_engine();
        let agent = AgentId::new("agent_1");
        engine.add_vehicle("agent_1", vec![EdgeId::new("e1"), EdgeId::new("e2")]);
        engine.advance_vehicle(&agent, 1);
        assert_eq!(engine.route_index(&agent).unwrap(), 1);
        engine.set_route(&agent, &[EdgeId::new("e2")]).unwrap();
        assert_eq!(engine.route_index(&agent).unwrap(), 0);
    }
}

#[cfg(test)]
mod coordinates {
    use super::*;

    #[test]
    fn geo_plane_round_trip() {
        let engine = MockEngine::new();
        let p = GeoPoint::new(34.07, -118.44);
        let (x, y) = engine.to_plane(p).unwrap();
        let back = engine.to_geo(x, y).unwrap();
        assert!((back.lat - p.lat).abs() < 1e-9);
        assert!((back.lon - p.lon).abs() < 1e-9);
    }

    #[test]
    fn rpc_counter_counts_every_call() {
        let engine = two_edge_engine();
        let before = engine.rpc_calls();
        let _ = engine.time();
        let _ = engine.vehicle_ids();
        assert_eq!(engine.rpc_calls(), before + 2);
    }
}
