//! Reply validation.
//!
//! The advisor is asked for comma-separated `name:quarters` items.  Items
//! that fail to split or name a POI that is neither in the catalog nor in
//! the agent's current chain are dropped with a warning; a reply with no
//! valid items at all means "no change" and yields the original chain with
//! an empty duration list.

use log::warn;

use rtc_core::time::SECS_PER_QUARTER;

/// Parse and validate an advisor reply.
///
/// `known` decides whether a stop name is acceptable (catalog or current
/// chain).  Returns the accepted stop names and their durations in seconds;
/// on a fully invalid reply, `(fallback, [])`.
pub fn parse_reply(
    reply: &str,
    known: impl Fn(&str) -> bool,
    fallback: &[String],
) -> (Vec<String>, Vec<u32>) {
    let mut names = Vec::new();
    let mut durations = Vec::new();

    for item in reply.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((name, quarters)) = item.split_once(':') else {
            warn!("invalid chain item {item:?}");
            continue;
        };
        let name = name.trim();
        let Ok(quarters) = quarters.trim().parse::<u32>() else {
            warn!("invalid duration in chain item {item:?}");
            continue;
        };
        if !known(name) {
            warn!("unknown stop {name:?} in advisor reply, dropped");
            continue;
        }
        names.push(name.to_string());
        durations.push(quarters * SECS_PER_QUARTER);
    }

    if names.is_empty() {
        return (fallback.to_vec(), Vec::new());
    }
    (names, durations)
}
