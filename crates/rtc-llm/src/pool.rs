//! Bounded parallel fan-out of advice requests.
//!
//! Each request is independent: workers share only the read-only advisor and
//! the name validator, and results merge by agent id with no ordering
//! requirement.  Per-request failures fall back to that agent's original
//! chain and never poison the batch.

use std::collections::HashMap;

use log::warn;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use rtc_core::AgentId;

use crate::advisor::{AdviceRequest, ChainAdvisor};
use crate::parse::parse_reply;

/// Modified chains per agent: `(stop names, durations in seconds)`.
pub type AdviceOutcome = HashMap<AgentId, (Vec<String>, Vec<u32>)>;

/// Run every request through the advisor with at most `workers` in flight.
pub fn advise_many<A, F>(
    advisor: &A,
    requests: &[AdviceRequest],
    workers: usize,
    known: &F,
) -> AdviceOutcome
where
    A: ChainAdvisor,
    F: Fn(&str) -> bool + Sync,
{
    let one = |request: &AdviceRequest| -> (AgentId, (Vec<String>, Vec<u32>)) {
        let fallback = request.chain_names();
        let outcome = match advisor.advise(request) {
            Ok(reply) => parse_reply(&reply, |name| known(name) || fallback.iter().any(|n| n == name), &fallback),
            Err(e) => {
                warn!("advisor failed for {}: {e}", request.agent);
                (fallback, Vec::new())
            }
        };
        (request.agent.clone(), outcome)
    };

    match ThreadPoolBuilder::new().num_threads(workers.max(1)).build() {
        Ok(pool) => pool.install(|| requests.par_iter().map(one).collect()),
        Err(e) => {
            warn!("worker pool unavailable ({e}), processing sequentially");
            requests.iter().map(one).collect()
        }
    }
}
