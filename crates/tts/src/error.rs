use axum::response::{IntoResponse, Response};
use http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;
use vocalis_core::HttpError;
use vocalis_ratelimit::RateLimitError;

use crate::{engine::EngineError, params::ValidationError};

pub type Result<T> = std::result::Result<T, TtsError>;

/// Errors surfaced by the synthesis endpoints
#[derive(Debug, Error)]
pub enum TtsError {
    /// Request parameters failed normalization
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client is inside its throttle interval
    #[error(transparent)]
    Throttled(#[from] RateLimitError),

    /// Engine failed to produce audio
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Audio was produced but could not be opened for streaming
    #[error("failed to open artifact: {0}")]
    Artifact(#[source] std::io::Error),

    /// Gateway could not be built from its configuration
    #[error("TTS configuration error: {0}")]
    Config(String),
}

impl HttpError for TtsError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Throttled(e) => e.status_code(),
            Self::Engine(_) | Self::Artifact(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Throttled(e) => e.client_message(),
            Self::Engine(_) | Self::Artifact(_) => "TTS failed".to_string(),
            Self::Config(_) => "Internal server error".to_string(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Engine(e) => Some(e.to_string()),
            Self::Artifact(e) => Some(e.to_string()),
            Self::Validation(_) | Self::Throttled(_) | Self::Config(_) => None,
        }
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        match self {
            Self::Throttled(e) => e.headers(),
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for TtsError {
    fn into_response(self) -> Response {
        vocalis_core::error_response(&self)
    }
}
