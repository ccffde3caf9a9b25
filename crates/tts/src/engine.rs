pub mod command;
pub mod http;

use std::{path::Path, sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use vocalis_config::EngineConfig;

use crate::params::SynthesisRequest;

/// Why an engine failed to produce audio
///
/// The display text is returned to the client as the failure detail.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be started or reached
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but reported a failure
    #[error("{0}")]
    Failed(String),

    /// Remote engine answered with a non-success status
    #[error("engine returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Transport failure talking to a remote engine
    #[error("engine request failed: {0}")]
    Connection(String),

    /// No answer within the configured timeout
    #[error("engine timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The engine finished but left no audio behind
    #[error("engine produced no audio")]
    NoAudio,

    /// Writing the output file failed
    #[error("failed to write audio: {0}")]
    Io(#[from] std::io::Error),

    /// Engine configuration is unusable
    #[error("engine configuration error: {0}")]
    Config(String),
}

/// Something that turns a validated request into an MP3 file
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    /// Write audio for `request` to `output`
    ///
    /// Returns once the file is complete.
    async fn synthesize(&self, request: &SynthesisRequest, output: &Path) -> Result<(), EngineError>;

    /// Engine name, used in logs and metrics
    fn name(&self) -> &str;
}

/// Build the configured engine
pub fn from_config(config: &EngineConfig) -> Result<Arc<dyn SynthesisEngine>, EngineError> {
    let engine: Arc<dyn SynthesisEngine> = match config {
        EngineConfig::Command(config) => Arc::new(command::CommandEngine::new(config)),
        EngineConfig::Http(config) => Arc::new(http::HttpEngine::new(config)?),
    };

    tracing::debug!(engine = engine.name(), "synthesis engine initialized");

    Ok(engine)
}

/// Check that the engine actually left audio at `output`
async fn ensure_audio(output: &Path) -> Result<(), EngineError> {
    match tokio::fs::metadata(output).await {
        Ok(metadata) if metadata.len() > 0 => Ok(()),
        Ok(_) => Err(EngineError::NoAudio),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(EngineError::NoAudio),
        Err(e) => Err(EngineError::Io(e)),
    }
}
