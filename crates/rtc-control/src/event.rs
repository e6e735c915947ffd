//! Events and the agent-interest model.
//!
//! An event is injected over the wire as a JSON body; the interest model
//! ranks agents by demographic fit and picks attendees under the event's
//! capacity.  All factors are multiplicative over a per-type base interest.
//!
//! Scoring has two documented entry points over the same demographic core:
//! [`InterestModel::interest_score`] applies the two-tier distance factor on
//! top of [`InterestModel::demographic_score`]; capacity selection ranks by
//! the demographic score alone, since every attendee travels to the same
//! venue anyway.

use serde::Deserialize;

use rtc_core::time::parse_hhmm_hour;
use rtc_core::{AgentId, GeoPoint};
use rtc_plan::{Demographics, Gender};

use crate::{ControlError, ControlResult};

// ── Event ─────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Sports,
    Entertainment,
}

/// A one-off event injected by the operator.
///
/// ```json
/// { "type": "sports", "name": "Bruins game", "location": "Pauley Pavilion",
///   "lat": 34.0703, "lon": -118.4468,
///   "start_time": "19:00", "duration": 3, "capacity": 40 }
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub name: String,
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    /// `HH:MM`; defaults to noon when absent or unparseable.
    #[serde(default)]
    pub start_time: Option<String>,
    /// Whole hours; defaults to two.
    #[serde(default)]
    pub duration: Option<u32>,
    pub capacity: usize,
}

impl Event {
    pub fn from_json(body: &str) -> ControlResult<Self> {
        serde_json::from_str(body).map_err(|e| ControlError::BadEvent(e.to_string()))
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// The event's time window in quarter-hour buckets.
    pub fn window(&self) -> EventWindow {
        let start_quarter = self
            .start_time
            .as_deref()
            .and_then(parse_hhmm_hour)
            .map(|h| h * 4)
            .unwrap_or(EventWindow::DEFAULT_START_QUARTER);
        let duration_quarters = self
            .duration
            .map(|h| h * 4)
            .unwrap_or(EventWindow::DEFAULT_DURATION_QUARTERS);
        EventWindow { start_quarter, duration_quarters }
    }
}

/// Start/duration of an event in quarters.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventWindow {
    pub start_quarter: u32,
    pub duration_quarters: u32,
}

impl EventWindow {
    /// 12:00.
    pub const DEFAULT_START_QUARTER: u32 = 48;
    /// Two hours.
    pub const DEFAULT_DURATION_QUARTERS: u32 = 8;
}

// ── Interest model ────────────────────────────────────────────────────────────

// Age bands as (exclusive upper age, factor), ascending; the first band whose
// bound exceeds the age wins, the fallthrough factor covers the oldest band.
const SPORTS_BASE: f64 = 0.7;
const SPORTS_AGE_BANDS: &[(u32, f64)] = &[
    (16, 0.5),
    (19, 0.990),
    (30, 1.002),
    (40, 1.006),
    (50, 1.006),
    (60, 1.003),
];
const SPORTS_AGE_ELDEST: f64 = 1.0001;
const SPORTS_GENDER_MALE: f64 = 1.002;
const SPORTS_GENDER_FEMALE: f64 = 0.998;

const ENTERTAINMENT_BASE: f64 = 0.8;
const ENTERTAINMENT_AGE_BANDS: &[(u32, f64)] = &[
    (16, 0.900),
    (18, 0.990),
    (35, 1.008),
    (70, 0.992),
];
const ENTERTAINMENT_AGE_ELDEST: f64 = 0.990;
const HIGH_INCOME_PERCENTILE: u32 = 80;
const HIGH_INCOME_BOOST: f64 = 1.2;

const NEAR_KM: f64 = 20.0;
const NEAR_FACTOR: f64 = 1.005;
const FAR_FACTOR: f64 = 0.995;

fn age_factor(bands: &[(u32, f64)], eldest: f64, age: u32) -> f64 {
    bands
        .iter()
        .find(|(bound, _)| age < *bound)
        .map(|(_, factor)| *factor)
        .unwrap_or(eldest)
}

/// Demographic interest scoring for events.
#[derive(Default)]
pub struct InterestModel;

impl InterestModel {
    pub fn new() -> Self {
        Self
    }

    /// Base interest adjusted by age, gender (sports), and income
    /// (entertainment).  No distance term.
    pub fn demographic_score(&self, demographics: &Demographics, kind: EventKind) -> f64 {
        match kind {
            EventKind::Sports => {
                let mut interest = SPORTS_BASE
                    * age_factor(SPORTS_AGE_BANDS, SPORTS_AGE_ELDEST, demographics.age);
                interest *= match demographics.gender {
                    Gender::Male => SPORTS_GENDER_MALE,
                    Gender::Female => SPORTS_GENDER_FEMALE,
                    Gender::Unspecified => 1.0,
                };
                interest
            }
            EventKind::Entertainment => {
                let mut interest = ENTERTAINMENT_BASE
                    * age_factor(ENTERTAINMENT_AGE_BANDS, ENTERTAINMENT_AGE_ELDEST, demographics.age);
                if demographics.income.percentile() > HIGH_INCOME_PERCENTILE {
                    interest *= HIGH_INCOME_BOOST;
                }
                interest
            }
        }
    }

    /// Two-tier proximity factor on great-circle distance.
    pub fn distance_factor(dist_km: f64) -> f64 {
        if dist_km <= NEAR_KM { NEAR_FACTOR } else { FAR_FACTOR }
    }

    /// Full interest score: demographics times proximity of the agent's
    /// first scheduled location to the venue.
    pub fn interest_score(
        &self,
        demographics: &Demographics,
        agent_pos: GeoPoint,
        event: &Event,
    ) -> f64 {
        self.demographic_score(demographics, event.kind)
            * Self::distance_factor(agent_pos.distance_km(event.position()))
    }

    /// Top `capacity` agents by demographic score, descending; ties keep
    /// input order.
    pub fn select(
        &self,
        agents: &[(AgentId, Demographics)],
        kind: EventKind,
        capacity: usize,
    ) -> Vec<AgentId> {
        let mut scored: Vec<(&AgentId, f64)> = agents
            .iter()
            .map(|(id, demo)| (id, self.demographic_score(demo, kind)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(capacity);
        scored.into_iter().map(|(id, _)| id.clone()).collect()
    }
}
