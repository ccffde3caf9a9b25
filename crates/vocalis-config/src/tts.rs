use std::path::PathBuf;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::HumanDuration;

/// Speech synthesis configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TtsConfig {
    /// Voice used when a request does not name one; must be allowed
    #[serde(default = "default_voice")]
    pub default_voice: String,
    /// Voices this deployment accepts
    #[serde(default = "default_allowed_voices")]
    pub allowed_voices: Vec<String>,
    /// Maximum text length in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,
    /// Append a sentence-final mark and a space so the engine does not
    /// swallow the last word
    #[serde(default = "default_terminal_pause")]
    pub terminal_pause: bool,
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            default_voice: default_voice(),
            allowed_voices: default_allowed_voices(),
            max_text_length: default_max_text_length(),
            terminal_pause: default_terminal_pause(),
            artifacts: ArtifactConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// On-disk storage for generated audio
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Artifacts older than this are removed by the next sweep
    #[serde(default = "default_max_age")]
    pub max_age: HumanDuration,
    /// Minimum time between full directory rescans
    #[serde(default = "default_rescan_interval")]
    pub rescan_interval: HumanDuration,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            max_age: default_max_age(),
            rescan_interval: default_rescan_interval(),
        }
    }
}

/// External synthesis engine
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineConfig {
    /// Spawn a command-line synthesizer per request
    Command(CommandEngineConfig),
    /// POST to an HTTP synthesis service
    Http(HttpEngineConfig),
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::Command(CommandEngineConfig::default())
    }
}

/// Command-line engine
///
/// Arguments may contain the placeholders `{text}`, `{voice}`, `{rate}`,
/// `{pitch}` and `{output}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandEngineConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    #[serde(default = "default_engine_timeout")]
    pub timeout: HumanDuration,
}

impl Default for CommandEngineConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            timeout: default_engine_timeout(),
        }
    }
}

/// HTTP engine
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpEngineConfig {
    /// Endpoint receiving `{text, voice, rate, pitch}` as JSON
    pub endpoint: Url,
    /// Sent as a bearer token when set
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_engine_timeout")]
    pub timeout: HumanDuration,
}

fn default_voice() -> String {
    "hi-IN-MadhurNeural".to_string()
}

fn default_allowed_voices() -> Vec<String> {
    [
        "hi-IN-SwaraNeural",
        "hi-IN-MadhurNeural",
        "en-US-AriaNeural",
        "en-US-GuyNeural",
        "en-IN-ArjunNeural",
        "en-US-AndrewNeural",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

const fn default_max_text_length() -> usize {
    350
}

const fn default_terminal_pause() -> bool {
    true
}

fn default_directory() -> PathBuf {
    PathBuf::from("audio_files")
}

const fn default_max_age() -> HumanDuration {
    HumanDuration::from_secs(120)
}

const fn default_rescan_interval() -> HumanDuration {
    HumanDuration::from_secs(60)
}

fn default_program() -> String {
    "edge-tts".to_string()
}

fn default_args() -> Vec<String> {
    [
        "--text={text}",
        "--voice={voice}",
        "--rate={rate}",
        "--pitch={pitch}",
        "--write-media={output}",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

const fn default_engine_timeout() -> HumanDuration {
    HumanDuration::from_secs(60)
}
