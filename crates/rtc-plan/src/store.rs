//! Persistent store of advisor-modified routes.
//!
//! Every accepted route change writes one record per agent; re-modifying an
//! agent overwrites its previous record.  The backing JSON file is truncated
//! to an empty array when the store is opened, so each run starts clean and
//! the file always reflects exactly the current run's modifications.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use rtc_core::{AgentId, EdgeId};

use crate::demographics::Demographics;
use crate::PlanResult;

// ── Records ───────────────────────────────────────────────────────────────────

/// One stop of a modified plan, as persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannedStop {
    pub name: String,
    pub edge: EdgeId,
    pub order: u32,
    pub activity: String,
    pub duration_secs: u32,
}

/// The full modified plan for one agent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModifiedRouteRecord {
    pub agent: AgentId,
    pub stops: Vec<PlannedStop>,
    /// Edge sequence the agent will drive.  For agents modified before
    /// spawning this holds the stop edges only; the engine fills in the
    /// connecting paths once the vehicle exists.
    pub route: Vec<EdgeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<Demographics>,
}

// ── RouteStore ────────────────────────────────────────────────────────────────

/// In-memory map of modified routes with write-through JSON persistence.
pub struct RouteStore {
    path: Option<PathBuf>,
    records: Vec<ModifiedRouteRecord>,
    by_agent: HashMap<AgentId, usize>,
}

impl RouteStore {
    /// Open a store backed by `path`.  The file is created (or truncated)
    /// immediately so stale records from earlier runs never survive.
    pub fn open(path: &Path) -> PlanResult<Self> {
        std::fs::write(path, "[]")?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            records: Vec::new(),
            by_agent: HashMap::new(),
        })
    }

    /// A store with no backing file, for tests and dry runs.
    pub fn in_memory() -> Self {
        Self { path: None, records: Vec::new(), by_agent: HashMap::new() }
    }

    /// Insert or overwrite the record for `record.agent` and persist.
    pub fn insert(&mut self, record: ModifiedRouteRecord) -> PlanResult<()> {
        match self.by_agent.get(&record.agent) {
            Some(&i) => self.records[i] = record,
            None => {
                self.by_agent.insert(record.agent.clone(), self.records.len());
                self.records.push(record);
            }
        }
        self.persist()
    }

    pub fn get(&self, agent: &AgentId) -> Option<&ModifiedRouteRecord> {
        self.by_agent.get(agent).map(|&i| &self.records[i])
    }

    pub fn contains(&self, agent: &AgentId) -> bool {
        self.by_agent.contains_key(agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModifiedRouteRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn persist(&self) -> PlanResult<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&self.records)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }
}
