use axum::response::{IntoResponse, Response};
use http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;
use vocalis_core::HttpError;
use vocalis_ratelimit::RateLimitError;

/// Errors surfaced by `GET /search`
#[derive(Debug, Error)]
pub enum SearchError {
    /// No query, or only whitespace
    #[error("Empty query")]
    EmptyQuery,

    /// `limit` is not a positive integer
    #[error("Invalid limit")]
    InvalidLimit,

    /// Client is inside its throttle interval
    #[error(transparent)]
    Throttled(#[from] RateLimitError),

    /// The search backend failed or answered with garbage
    #[error("{0}")]
    Upstream(String),
}

impl HttpError for SearchError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::EmptyQuery | Self::InvalidLimit => StatusCode::BAD_REQUEST,
            Self::Throttled(e) => e.status_code(),
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Throttled(e) => e.client_message(),
            Self::Upstream(_) => "Search failed".to_string(),
            other => other.to_string(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::Upstream(message) => Some(message.clone()),
            _ => None,
        }
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        match self {
            Self::Throttled(e) => e.headers(),
            _ => Vec::new(),
        }
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        vocalis_core::error_response(&self)
    }
}
