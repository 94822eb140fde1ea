use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reactor_engine::EngineConfig;
use serde::Deserialize;

/// Reference host settings, loaded from an optional JSON file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HostConfig {
    pub engine: EngineConfig,
    /// How long a released object can still produce a thrown hit.
    pub release_window_ms: u64,
    /// Frame length of the safe-point loop.
    pub frame_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            release_window_ms: 5000,
            frame_ms: 16,
        }
    }
}

impl HostConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn release_window(&self) -> Duration {
        Duration::from_millis(self.release_window_ms)
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}
