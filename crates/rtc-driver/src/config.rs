//! Driver configuration.

use std::time::Duration;

/// Tunables for one control-loop run.  Plain data; construct with struct
/// update syntax over [`DriverConfig::default`].
#[derive(Clone, Debug)]
pub struct DriverConfig {
    /// Where the viewer acceptor listens.
    pub listen_addr: String,
    /// Engine clock value the warmup phase steps towards.
    pub start_offset_secs: f64,
    /// Sleep between ticks, capping the loop rate.
    pub loop_delay: Duration,
    /// Steps between progress log lines.
    pub status_interval_steps: u64,
    /// Parallelism ceiling for advisor fan-out.
    pub llm_workers: usize,
    /// Search radius for substitute POIs around a closed edge, metres.
    pub nearby_radius_m: f64,
    /// How many substitute POIs to offer per closed edge.
    pub nearby_suggestions: usize,
    /// Dwell time for stops that arrive without a duration.
    pub default_stop_secs: u32,
    /// Seed for stop-position sampling.
    pub seed: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8814".to_string(),
            start_offset_secs: 0.0,
            loop_delay: Duration::from_millis(10),
            status_interval_steps: 1_000,
            llm_workers: 50,
            nearby_radius_m: 500.0,
            nearby_suggestions: 3,
            default_stop_secs: 900,
            seed: 42,
        }
    }
}
