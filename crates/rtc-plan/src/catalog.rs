//! `ItineraryCatalog` — the per-agent activity chains loaded at startup.
//!
//! # JSON format
//!
//! One record per agent:
//!
//! ```json
//! [
//!   {
//!     "agent": "agent_1",
//!     "demographics": { "age": 34, "gender": "female", "income": "medium" },
//!     "stops": [
//!       { "name": "Home",   "edge": "e1", "order": 0, "purpose": "home",
//!         "start_secs": 0,     "duration_secs": 28800 },
//!       { "name": "Cafe A", "edge": "e4", "order": 1, "purpose": "cafe",
//!         "start_secs": 28800, "duration_secs": 3600 }
//!     ]
//!   }
//! ]
//! ```
//!
//! `demographics` may be absent; such agents are skipped by event-interest
//! scoring but keep their chains.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use rtc_core::AgentId;

use crate::chain::ChainEntry;
use crate::demographics::Demographics;
use crate::PlanResult;

// ── Itinerary ─────────────────────────────────────────────────────────────────

/// One agent's planned day.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    pub agent: AgentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
    pub stops: Vec<ChainEntry>,
}

// ── ItineraryCatalog ──────────────────────────────────────────────────────────

/// Read-only catalog of agent itineraries, keyed by agent id.
pub struct ItineraryCatalog {
    itineraries: Vec<Itinerary>,
    by_agent: HashMap<AgentId, usize>,
}

impl ItineraryCatalog {
    /// Load itineraries from a JSON file.
    pub fn load_json(path: &Path) -> PlanResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::load_reader(file)
    }

    /// Like [`load_json`][Self::load_json] but accepts any `Read` source.
    pub fn load_reader<R: Read>(reader: R) -> PlanResult<Self> {
        let itineraries: Vec<Itinerary> = serde_json::from_reader(reader)?;
        Ok(Self::from_itineraries(itineraries))
    }

    /// Build a catalog from already-constructed records.  Later records win
    /// the agent-id lookup when ids repeat.
    pub fn from_itineraries(itineraries: Vec<Itinerary>) -> Self {
        let by_agent = itineraries
            .iter()
            .enumerate()
            .map(|(i, it)| (it.agent.clone(), i))
            .collect();
        Self { itineraries, by_agent }
    }

    pub fn get(&self, agent: &AgentId) -> Option<&Itinerary> {
        self.by_agent.get(agent).map(|&i| &self.itineraries[i])
    }

    /// The agent's activity chain, or an empty slice for unknown agents.
    pub fn chain_of(&self, agent: &AgentId) -> &[ChainEntry] {
        self.get(agent).map(|it| it.stops.as_slice()).unwrap_or(&[])
    }

    pub fn demographics_of(&self, agent: &AgentId) -> Option<&Demographics> {
        self.get(agent).and_then(|it| it.demographics.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Itinerary> {
        self.itineraries.iter()
    }

    pub fn len(&self) -> usize {
        self.itineraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itineraries.is_empty()
    }
}
