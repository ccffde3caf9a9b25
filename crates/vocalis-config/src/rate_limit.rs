use serde::Deserialize;

use crate::HumanDuration;

/// Per-client request pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Minimum time between two accepted requests from one client
    #[serde(default = "default_min_interval")]
    pub min_interval: HumanDuration,
    /// Upper bound on tracked clients before an eager prune
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    /// How often stale client entries are dropped
    #[serde(default = "default_prune_interval")]
    pub prune_interval: HumanDuration,
    /// Optional limit across all clients
    #[serde(default)]
    pub global: Option<RequestRateLimit>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval: default_min_interval(),
            max_clients: default_max_clients(),
            prune_interval: default_prune_interval(),
            global: None,
        }
    }
}

/// Request-count limit over a window
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestRateLimit {
    /// Maximum requests per window
    pub requests: u32,
    /// Window duration (e.g. "1m")
    pub window: HumanDuration,
}

const fn default_min_interval() -> HumanDuration {
    HumanDuration::from_secs(2)
}

const fn default_max_clients() -> usize {
    100_000
}

const fn default_prune_interval() -> HumanDuration {
    HumanDuration::from_secs(60)
}
