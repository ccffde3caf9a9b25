use serde::Deserialize;
use url::Url;

use crate::HumanDuration;

/// SearXNG-backed search with a memoizing answer cache
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Base URL of the SearXNG instance (e.g. `https://searx.be`)
    pub base_url: Url,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_categories")]
    pub categories: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
    /// Results returned when the request has no `limit`
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Hard cap on `limit`
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: HumanDuration,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_categories() -> String {
    "general".to_string()
}

fn default_user_agent() -> String {
    concat!("vocalis/", env!("CARGO_PKG_VERSION")).to_string()
}

const fn default_timeout() -> HumanDuration {
    HumanDuration::from_secs(15)
}

const fn default_limit() -> usize {
    5
}

const fn default_max_limit() -> usize {
    20
}

const fn default_cache_ttl() -> HumanDuration {
    HumanDuration::from_secs(600)
}

const fn default_cache_capacity() -> u64 {
    1000
}
