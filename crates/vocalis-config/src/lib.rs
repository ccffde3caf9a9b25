#![allow(clippy::must_use_candidate)]

pub mod cors;
mod duration;
mod env;
pub mod health;
mod loader;
pub mod rate_limit;
pub mod search;
pub mod server;
pub mod telemetry;
pub mod tts;

use serde::Deserialize;

pub use cors::*;
pub use duration::HumanDuration;
pub use health::*;
pub use rate_limit::*;
pub use search::*;
pub use server::*;
pub use telemetry::TelemetryConfig;
pub use tts::*;

/// Top-level Vocalis configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsConfig,
    /// Web search proxy, disabled when absent
    #[serde(default)]
    pub search: Option<SearchConfig>,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
