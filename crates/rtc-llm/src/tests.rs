//! Unit tests for reply parsing, prompts, and the worker pool.

use std::collections::HashMap;

use rtc_core::AgentId;

use crate::advisor::{AdviceRequest, ChainAdvisor, NoopAdvisor, TimedStop};
use crate::parse::parse_reply;
use crate::pool::advise_many;
use crate::prompt::{event_situation, road_closure_situation, user_prompt};
use crate::{LlmError, LlmResult};

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn stop(name: &str, start_quarter: u32, duration_quarters: u32) -> TimedStop {
    TimedStop { name: name.to_string(), start_quarter, duration_quarters }
}

fn request(agent: &str, chain: &[&str]) -> AdviceRequest {
    AdviceRequest {
        agent: AgentId::new(agent),
        chain: chain
            .iter()
            .enumerate()
            .map(|(i, name)| stop(name, 32 + 4 * i as u32, 4))
            .collect(),
        location: "Cafe A".to_string(),
        demographics: None,
        traffic: String::new(),
        situation: "Road x is closed.".to_string(),
    }
}

/// Advisor with canned replies; unlisted agents error out.
struct ScriptedAdvisor {
    replies: HashMap<AgentId, String>,
}

impl ChainAdvisor for ScriptedAdvisor {
    fn advise(&self, request: &AdviceRequest) -> LlmResult<String> {
        self.replies
            .get(&request.agent)
            .cloned()
            .ok_or_else(|| LlmError::Http("connection refused".to_string()))
    }
}

const KNOWN: [&str; 3] = ["Home", "Cafe A", "Ralphs"];

fn known(name: &str) -> bool {
    KNOWN.contains(&name)
}

#[cfg(test)]
mod parsing {
    use super::*;

    #[test]
    fn valid_reply_yields_names_and_seconds() {
        let (names, durations) =
            parse_reply("Home:32, Cafe A:4, Ralphs:8", known, &["Home".to_string()]);
        assert_eq!(names, vec!["Home", "Cafe A", "Ralphs"]);
        assert_eq!(durations, vec![28_800, 3_600, 7_200]);
    }

    #[test]
    fn invalid_items_are_dropped_not_fatal() {
        let fallback = vec!["Home".to_string()];
        let (names, durations) = parse_reply(
            "Cafe A:4, Atlantis:8, no-colon-here, Ralphs:abc",
            known,
            &fallback,
        );
        assert_eq!(names, vec!["Cafe A"]);
        assert_eq!(durations, vec![3_600]);
    }

    #[test]
    fn unparseable_reply_falls_back_to_original_chain() {
        let fallback = vec!["Home".to_string(), "Cafe A".to_string()];
        let (names, durations) = parse_reply("I think the agent should stay home.", known, &fallback);
        assert_eq!(names, fallback);
        assert!(durations.is_empty());
    }

    #[test]
    fn empty_reply_falls_back() {
        let fallback = vec!["Home".to_string()];
        let (names, durations) = parse_reply("", known, &fallback);
        assert_eq!(names, fallback);
        assert!(durations.is_empty());
    }
}

#[cfg(test)]
mod prompts {
    use super::*;

    #[test]
    fn user_prompt_carries_chain_timing_and_situation() {
        let prompt = user_prompt(&request("agent_1", &["Home", "Cafe A"]));
        assert!(prompt.contains("agent_1"));
        assert!(prompt.contains("Home: 08:00-09:00 (quarters 32-36, duration: 4 quarters)"));
        assert!(prompt.contains("Situation: Road x is closed."));
        assert!(prompt.contains("No significant traffic congestion reported"));
    }

    #[test]
    fn closure_situation_lists_edges_and_alternatives() {
        let text = road_closure_situation(
            &["e1".into(), "e2".into()],
            &["Cafe A".to_string()],
            "Near e1: Deli (restaurant, 30m away)",
        );
        assert!(text.contains("Roads e1, e2 are closed"));
        assert!(text.contains("Cafe A"));
        assert!(text.contains("Deli"));
    }

    #[test]
    fn event_situation_computes_end_time() {
        let text = event_situation("sports", "Game", "Stadium", "19:00", 3);
        assert!(text.contains("Start Time: 19:00"));
        assert!(text.contains("End Time: 22:00"));
    }
}

#[cfg(test)]
mod worker_pool {
    use super::*;

    #[test]
    fn merges_results_by_agent_with_per_request_fallback() {
        let advisor = ScriptedAdvisor {
            replies: [(AgentId::new("agent_1"), "Cafe A:4, Ralphs:8".to_string())].into(),
        };
        let requests = vec![
            request("agent_1", &["Home"]),
            request("agent_2", &["Home", "Cafe A"]),
        ];

        let outcome = advise_many(&advisor, &requests, 4, &known);
        assert_eq!(outcome.len(), 2);

        let (names, durations) = &outcome[&AgentId::new("agent_1")];
        assert_eq!(names, &vec!["Cafe A".to_string(), "Ralphs".to_string()]);
        assert_eq!(durations, &vec![3_600, 7_200]);

        // agent_2's call failed: original chain, no durations.
        let (names, durations) = &outcome[&AgentId::new("agent_2")];
        assert_eq!(names, &vec!["Home".to_string(), "Cafe A".to_string()]);
        assert!(durations.is_empty());
    }

    #[test]
    fn chain_names_count_as_known_even_off_catalog() {
        let advisor = ScriptedAdvisor {
            replies: [(AgentId::new("agent_1"), "Pop-up Market:4".to_string())].into(),
        };
        let requests = vec![request("agent_1", &["Pop-up Market"])];

        let outcome = advise_many(&advisor, &requests, 1, &known);
        let (names, durations) = &outcome[&AgentId::new("agent_1")];
        assert_eq!(names, &vec!["Pop-up Market".to_string()]);
        assert_eq!(durations, &vec![3_600]);
    }

    #[test]
    fn noop_advisor_keeps_every_chain() {
        let requests = vec![request("agent_1", &["Home", "Cafe A"])];
        let outcome = advise_many(&NoopAdvisor, &requests, 2, &known);
        let (names, durations) = &outcome[&AgentId::new("agent_1")];
        assert_eq!(names, &vec!["Home".to_string(), "Cafe A".to_string()]);
        assert!(durations.is_empty());
    }
}
