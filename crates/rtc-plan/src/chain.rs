//! Activity chains and day-cursor time bookkeeping.
//!
//! An agent's day is a *chain* of timed stops at named POIs.  Times are kept
//! in seconds since midnight; durations negotiated with the chain advisor
//! arrive in quarter-hour buckets and are converted on the way in.

use serde::{Deserialize, Serialize};

use rtc_core::time::{SECS_PER_QUARTER, clamp_day_cursor, quarters_to_secs};
use rtc_core::EdgeId;

// ── ChainEntry ────────────────────────────────────────────────────────────────

/// One stop in an agent's activity chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// POI display name, as known to the catalog.
    pub name: String,
    /// Road edge the stop is placed on.
    pub edge: EdgeId,
    /// Position within the chain, 0-based.
    pub order: u32,
    /// Activity category ("home", "work", "cafe", …).
    pub purpose: String,
    /// Arrival time, seconds since midnight.
    pub start_secs: u32,
    /// Dwell time at the stop, in seconds.
    pub duration_secs: u32,
}

impl ChainEntry {
    /// Departure time, seconds since midnight.
    #[inline]
    pub fn end_secs(&self) -> u32 {
        self.start_secs + self.duration_secs
    }

    /// Dwell time in quarter-hour buckets, rounded down.
    #[inline]
    pub fn duration_quarters(&self) -> u32 {
        self.duration_secs / SECS_PER_QUARTER
    }
}

// ── DayCursor ─────────────────────────────────────────────────────────────────

/// Walks a day position in quarter-hour buckets while a chain is rebuilt.
///
/// Each [`advance`][DayCursor::advance] yields the (clamped) start quarter
/// for one stop and moves the cursor past its duration.  A cursor that has
/// run past midnight is pulled back to 23:00 so the closing activity still
/// gets a positive dwell time.
#[derive(Debug)]
pub struct DayCursor {
    quarter: u32,
}

impl DayCursor {
    pub fn new(start_quarter: u32) -> Self {
        Self { quarter: start_quarter }
    }

    /// Claim `duration_quarters` of the day; returns the stop's start quarter.
    pub fn advance(&mut self, duration_quarters: u32) -> u32 {
        let start = clamp_day_cursor(self.quarter);
        self.quarter = start + duration_quarters;
        start
    }

    /// Current position, unclamped.
    pub fn position(&self) -> u32 {
        self.quarter
    }
}

/// Rebuild a chain's timing from `(name, duration_quarters)` pairs.
///
/// Returns `(name, start_secs, duration_secs)` triples starting at
/// `start_quarter`.  Used when the chain advisor hands back a revised chain
/// whose stop times must be laid out afresh.
pub fn lay_out_chain(
    stops: &[(String, u32)],
    start_quarter: u32,
) -> Vec<(String, u32, u32)> {
    let mut cursor = DayCursor::new(start_quarter);
    stops
        .iter()
        .map(|(name, quarters)| {
            let start = cursor.advance(*quarters);
            (name.clone(), quarters_to_secs(start), quarters_to_secs(*quarters))
        })
        .collect()
}
