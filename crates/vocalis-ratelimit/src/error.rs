use http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;
use vocalis_core::HttpError;

/// Rate limiting errors
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// Configuration error
    #[error("rate limit configuration error: {0}")]
    Config(String),

    /// Rate limit exceeded
    #[error("rate limit exceeded")]
    Exceeded {
        /// Seconds until another request would be accepted
        retry_after: u64,
    },
}

impl HttpError for RateLimitError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Exceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Exceeded { .. } => "Too many requests".to_string(),
            Self::Config(_) => "Internal server error".to_string(),
        }
    }

    fn headers(&self) -> Vec<(HeaderName, HeaderValue)> {
        match self {
            Self::Exceeded { retry_after } => vec![(http::header::RETRY_AFTER, HeaderValue::from(*retry_after))],
            Self::Config(_) => Vec::new(),
        }
    }
}
