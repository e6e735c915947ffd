//! Prompt construction for the chain advisor.

use std::fmt::Write;

use rtc_core::EdgeId;
use rtc_core::time::{SECS_PER_QUARTER, secs_to_hhmm};
use rtc_plan::Demographics;

use crate::advisor::AdviceRequest;

/// Fixed instruction preamble.  The reply format it demands is what
/// [`crate::parse::parse_reply`] accepts.
pub const SYSTEM_PROMPT: &str = "\
You are an assistant that modifies activity chains for agents in a traffic \
simulation. Given the current activity chain with timing information, the \
agent's current location, demographics, traffic conditions, and the described \
situation, suggest a modified chain that makes sense.

Respect any event timing in the situation: the agent must be at the event \
location during the specified window, and conflicting activities must be \
rescheduled before or after it.

Only respond with the new activity chain as a comma-separated list of POI \
names and durations in quarters (15-minute blocks).
Format: POI_name:quarters, POI_name:quarters, ...
Example: Falafel Inc.:32, Starbucks:4, Ralphs:8, Falafel Inc.:36

Each quarter is 15 minutes (4 quarters = 1 hour, 96 quarters = 24 hours). Do \
not include any explanations or additional text.";

/// The per-agent user prompt.
pub fn user_prompt(request: &AdviceRequest) -> String {
    let timing: Vec<String> = request
        .chain
        .iter()
        .map(|stop| {
            let start = stop.start_quarter * SECS_PER_QUARTER;
            let end = (stop.start_quarter + stop.duration_quarters) * SECS_PER_QUARTER;
            format!(
                "{}: {}-{} (quarters {}-{}, duration: {} quarters)",
                stop.name,
                secs_to_hhmm(start),
                secs_to_hhmm(end),
                stop.start_quarter,
                stop.start_quarter + stop.duration_quarters,
                stop.duration_quarters
            )
        })
        .collect();

    format!(
        "Agent ID: {}\n\
         Current location: {}\n\
         Demographics: {}\n\n\
         Current activity chain with timing:\n{}\n\n\
         Traffic conditions:\n{}\n\n\
         Situation: {}\n\n\
         Provide the new chain as a comma-separated list of POI names with \
         durations in quarters (15-minute blocks). Only include POI names \
         that exist in the current chain or the catalog. Each quarter is 15 \
         minutes, so 4 quarters = 1 hour.",
        request.agent,
        request.location,
        describe_demographics(request.demographics.as_ref()),
        timing.join(" | "),
        if request.traffic.is_empty() {
            "No significant traffic congestion reported"
        } else {
            &request.traffic
        },
        request.situation,
    )
}

/// Situation text for a road closure.
pub fn road_closure_situation(
    closed_edges: &[EdgeId],
    affected_pois: &[String],
    alternatives: &str,
) -> String {
    let edges: Vec<&str> = closed_edges.iter().map(|e| e.as_str()).collect();
    format!(
        "Roads {} are closed. The following destinations are no longer \
         accessible: {}. Alternative locations you might consider: {} \
         Please suggest an alternative route that avoids these locations \
         while maintaining the general purpose of the trip.",
        edges.join(", "),
        affected_pois.join(", "),
        alternatives,
    )
}

/// Situation text for an injected event.
pub fn event_situation(
    kind: &str,
    name: &str,
    location: &str,
    start_time: &str,
    duration_hours: u32,
) -> String {
    let end_time = start_time
        .split(':')
        .next()
        .and_then(|h| h.trim().parse::<u32>().ok())
        .map(|h| format!("{:02}:00", (h + duration_hours) % 24))
        .unwrap_or_else(|| "14:00".to_string());

    let mut text = String::new();
    let _ = write!(
        text,
        "A {kind} event is happening at {location}. The event details:\n\
         - Type: {kind}\n\
         - Event Name: {name}\n\
         - Location: {location}\n\
         - Start Time: {start_time}\n\
         - End Time: {end_time}\n\
         - Duration: {duration_hours} hours\n\n\
         Please modify the agent's current activity chain to include this \
         event at the specified time ({start_time}-{end_time}), considering \
         the agent's demographics and existing activities. Make sure to \
         adjust or reschedule any conflicting activities to accommodate the \
         event during its scheduled time."
    );
    text
}

fn describe_demographics(demographics: Option<&Demographics>) -> String {
    match demographics {
        Some(d) => format!(
            "Age: {}, Gender: {:?}, Income: {:?}",
            d.age, d.gender, d.income
        ),
        None => "No demographic information available.".to_string(),
    }
}
