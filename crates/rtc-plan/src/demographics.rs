//! Agent demographic attributes.
//!
//! Demographics ride along with each itinerary record and drive the
//! event-interest scoring: age band, gender, and household income each
//! contribute a multiplicative factor to an agent's interest in an event.

use serde::{Deserialize, Serialize};

/// Reported gender of a synthetic agent.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    /// Anything the source data does not label.
    #[serde(other)]
    Unspecified,
}

/// Coarse household income band.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncomeLevel {
    Low,
    Medium,
    High,
}

impl IncomeLevel {
    /// Representative income percentile for the band.  Interest scoring
    /// works on percentiles rather than dollar amounts.
    pub fn percentile(self) -> u32 {
        match self {
            IncomeLevel::Low => 20,
            IncomeLevel::Medium => 50,
            IncomeLevel::High => 90,
        }
    }
}

/// One agent's demographic record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: u32,
    pub gender: Gender,
    pub income: IncomeLevel,
}
