//! Control loop demo on the in-memory engine.
//!
//! Serves the viewer protocol on 127.0.0.1:8814 for sixty seconds over a
//! four-edge network with two agents, one live from the start and one
//! spawning a minute in.  Connect with netcat and try, for example,
//! `HIGHLIGHT:agent_1` or `CLOSE_ROADS:x`.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use rtc_core::{AgentId, EdgeId, GeoPoint};
use rtc_driver::{Driver, DriverConfig};
use rtc_engine::MockEngine;
use rtc_llm::NoopAdvisor;
use rtc_plan::{
    ChainEntry, Demographics, Gender, IncomeLevel, Itinerary, ItineraryCatalog, RouteStore,
};
use rtc_poi::{Poi, PoiCatalog};

const METERS_PER_DEG: f64 = 111_320.0;
const RUN_SECS: u64 = 60;

fn geo(x_m: f64, y_m: f64) -> GeoPoint {
    GeoPoint::new(34.0689 + y_m / METERS_PER_DEG, -118.4452 + x_m / METERS_PER_DEG)
}

fn network() -> MockEngine {
    let mut engine = MockEngine::new();
    engine
        .add_edge("x", vec![(0.0, 0.0), (200.0, 0.0)])
        .add_edge("e0", vec![(0.0, -80.0), (200.0, -80.0)])
        .add_edge("e1", vec![(0.0, 60.0), (200.0, 60.0)])
        .add_edge("e2", vec![(0.0, 300.0), (200.0, 300.0)])
        .add_vehicle("agent_1", vec![EdgeId::new("e0"), EdgeId::new("x")])
        .schedule_spawn("agent_2", 60.0, vec![EdgeId::new("e1")]);
    engine
}

fn pois() -> PoiCatalog {
    PoiCatalog::from_pois(vec![
        Poi {
            id: "p0".into(),
            name: "Cafe A".to_string(),
            pos: geo(100.0, 0.0),
            category: "cafe".to_string(),
            edge: EdgeId::new("x"),
        },
        Poi {
            id: "p1".into(),
            name: "Deli".to_string(),
            pos: geo(100.0, 60.0),
            category: "restaurant".to_string(),
            edge: EdgeId::new("e1"),
        },
        Poi {
            id: "p2".into(),
            name: "Ralphs".to_string(),
            pos: geo(100.0, 300.0),
            category: "supermarket".to_string(),
            edge: EdgeId::new("e2"),
        },
    ])
}

fn itineraries() -> ItineraryCatalog {
    let stop = |name: &str, edge: &str, order: u32| ChainEntry {
        name: name.to_string(),
        edge: EdgeId::new(edge),
        order,
        purpose: "errand".to_string(),
        start_secs: 28_800 + order * 3_600,
        duration_secs: 3_600,
    };
    ItineraryCatalog::from_itineraries(vec![
        Itinerary {
            agent: AgentId::new("agent_1"),
            demographics: Some(Demographics {
                age: 34,
                gender: Gender::Female,
                income: IncomeLevel::Medium,
            }),
            stops: vec![stop("Cafe A", "x", 0), stop("Ralphs", "e2", 1)],
        },
        Itinerary {
            agent: AgentId::new("agent_2"),
            demographics: Some(Demographics {
                age: 25,
                gender: Gender::Male,
                income: IncomeLevel::High,
            }),
            stops: vec![stop("Deli", "e1", 0)],
        },
    ])
}

fn main() -> Result<()> {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )?;

    let config = DriverConfig {
        status_interval_steps: 500,
        ..Default::default()
    };
    let driver = Driver::new(
        config,
        network(),
        NoopAdvisor,
        pois(),
        itineraries(),
        RouteStore::in_memory(),
    );

    let stop = driver.stop_handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(RUN_SECS));
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
    });

    info!("running for {RUN_SECS}s");
    driver.run()?;
    Ok(())
}
