use axum::{
    Json,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use serde::Serialize;

/// Trait for domain errors that can be converted to HTTP responses
///
/// Implemented by each feature crate's error type. Every failure path of
/// the gateway answers with the same flat JSON shape, so the conversion
/// lives here rather than in each crate.
pub trait HttpError: std::error::Error {
    /// HTTP status code for this error
    fn status_code(&self) -> StatusCode;

    /// Human-readable reason placed in the `error` field
    fn client_message(&self) -> String;

    /// Optional detail placed in the `detail` field (e.g. an upstream message)
    fn detail(&self) -> Option<String> {
        None
    }

    /// Extra response headers (e.g. `Retry-After`)
    fn headers(&self) -> Vec<(http::HeaderName, http::HeaderValue)> {
        Vec::new()
    }
}

/// JSON body returned on every failure path
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Render any [`HttpError`] as `{"error": ..., "detail": ...}`
pub fn error_response<E: HttpError>(error: &E) -> Response {
    let body = ErrorBody {
        error: error.client_message(),
        detail: error.detail(),
    };

    let mut response = (error.status_code(), Json(body)).into_response();

    for (name, value) in error.headers() {
        response.headers_mut().insert(name, value);
    }

    response
}
