//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

/// Geometry and policy parameters for the checkpoint ring.
///
/// Defaults can be overridden via environment (`TRAILWATCH_*`) or by
/// deserializing an `[engine]` section from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Distance from the agent to each checkpoint center, meters (default 150).
    pub checkpoint_distance_m: f64,
    /// Radius of each checkpoint region, meters (default 100).
    pub checkpoint_radius_m: f64,
    /// Delay before a checkpoint notification fires, seconds (default 1).
    pub notify_delay_secs: f64,
    /// Consecutive update-cycle restarts allowed when the provider delivers
    /// an empty fix list, before the engine declares a stall (default 1).
    pub empty_fix_retry_cap: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            checkpoint_distance_m: std::env::var("TRAILWATCH_CHECKPOINT_DISTANCE_M")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(150.0),
            checkpoint_radius_m: std::env::var("TRAILWATCH_CHECKPOINT_RADIUS_M")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(100.0),
            notify_delay_secs: std::env::var("TRAILWATCH_NOTIFY_DELAY_SECS")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(1.0),
            empty_fix_retry_cap: std::env::var("TRAILWATCH_EMPTY_FIX_RETRY_CAP")
                .ok().and_then(|v| v.parse().ok()).unwrap_or(1),
        }
    }
}
