//! Quarter-hour time model.
//!
//! Activity durations are negotiated with the chain advisor in *quarters* —
//! fixed 15-minute buckets, 96 per day.  Engine time stays in plain seconds
//! (`f64`, the engine's own clock); these helpers convert between the two
//! and format times for prompts and logs.

/// Seconds in one quarter-hour bucket.
pub const SECS_PER_QUARTER: u32 = 900;

/// Quarter buckets in one day.
pub const QUARTERS_PER_DAY: u32 = 96;

/// How far a day cursor that overran midnight is backed up, in quarters.
/// Four quarters puts the final evening activity at 23:00.
pub const DAY_OVERRUN_BACKOFF: u32 = 4;

/// Convert a duration in quarters to seconds.
#[inline]
pub fn quarters_to_secs(quarters: u32) -> u32 {
    quarters * SECS_PER_QUARTER
}

/// Quarter index (0–95) for a seconds-since-midnight offset.
#[inline]
pub fn secs_to_quarter(secs: u32) -> u32 {
    (secs / 60) / 15
}

/// Format a seconds-since-midnight offset as `HH:MM`.
pub fn secs_to_hhmm(secs: u32) -> String {
    let hours = secs / 3_600;
    let minutes = (secs % 3_600) / 60;
    format!("{hours:02}:{minutes:02}")
}

/// Parse the hour out of an `HH:MM` string.  Returns `None` for anything
/// that does not start with an integer hour in 0–23.
pub fn parse_hhmm_hour(s: &str) -> Option<u32> {
    let hour: u32 = s.split(':').next()?.trim().parse().ok()?;
    (hour < 24).then_some(hour)
}

/// Clamp a day-position cursor that overran midnight.
///
/// A chain whose activities run past quarter 96 backs up a fixed
/// [`DAY_OVERRUN_BACKOFF`] quarters (to 23:00) so the closing evening
/// activity always gets a positive duration.
#[inline]
pub fn clamp_day_cursor(quarter: u32) -> u32 {
    if quarter >= QUARTERS_PER_DAY {
        QUARTERS_PER_DAY - DAY_OVERRUN_BACKOFF
    } else {
        quarter
    }
}
