use std::time::Duration;

use serde::Deserialize;

/// Engine tuning. Every field has a default, so an empty JSON object is a
/// valid config.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Repeated hits on the same target by the same rule within this window
    /// are suppressed. 0 disables debouncing.
    pub hit_debounce_ms: u64,
    /// Interaction counters idle for longer than this are evicted.
    pub interaction_ttl_secs: u64,
    /// Sweep the tracking maps every N triggers.
    pub sweep_every: u32,
    /// Fixed RNG seed for reproducible chance rolls.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_debounce_ms: 250,
            interaction_ttl_secs: 300,
            sweep_every: 256,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn hit_debounce(&self) -> Duration {
        Duration::from_millis(self.hit_debounce_ms)
    }

    pub fn interaction_ttl(&self) -> Duration {
        Duration::from_secs(self.interaction_ttl_secs)
    }
}
