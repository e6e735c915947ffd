//! The `ChainAdvisor` seam.
//!
//! The control core never reasons about natural language itself; it hands an
//! [`AdviceRequest`] to an advisor and gets raw structured text back.  The
//! reply contract (comma-separated `name:quarters` items) is enforced by
//! [`crate::parse`], not by the advisor, so every advisor backend shares the
//! same validation and fallback behavior.

use rtc_core::AgentId;
use rtc_plan::Demographics;

use crate::LlmResult;

/// One chain stop with its timing, in quarter-hour buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimedStop {
    pub name: String,
    pub start_quarter: u32,
    pub duration_quarters: u32,
}

/// Everything an advisor gets to see about one agent.
#[derive(Clone, Debug)]
pub struct AdviceRequest {
    pub agent: AgentId,
    /// The current chain with timing.
    pub chain: Vec<TimedStop>,
    /// Human-readable current location (nearest POI name, or "unknown").
    pub location: String,
    pub demographics: Option<Demographics>,
    /// One-line traffic summary.
    pub traffic: String,
    /// What happened: the closure or event situation text.
    pub situation: String,
}

impl AdviceRequest {
    /// The chain's stop names, used as the fallback when a reply is invalid.
    pub fn chain_names(&self) -> Vec<String> {
        self.chain.iter().map(|s| s.name.clone()).collect()
    }
}

/// An advice backend.  `Sync` so the worker pool can fan requests out.
pub trait ChainAdvisor: Sync {
    /// Produce the raw reply text for one request.
    fn advise(&self, request: &AdviceRequest) -> LlmResult<String>;
}

/// Advisor that never suggests anything; every agent keeps its chain.
/// Used when no API key is configured.
pub struct NoopAdvisor;

impl ChainAdvisor for NoopAdvisor {
    fn advise(&self, _request: &AdviceRequest) -> LlmResult<String> {
        Ok(String::new())
    }
}
