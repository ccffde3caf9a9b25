use std::time::Duration;

use axum::http;
use reqwest::ClientBuilder;

/// Connection settings shared by remote engines
///
/// Per-call timeouts are applied on each request, not here.
pub fn client_builder() -> ClientBuilder {
    let mut headers = http::HeaderMap::new();
    headers.insert(http::header::CONNECTION, http::HeaderValue::from_static("keep-alive"));

    reqwest::Client::builder()
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .default_headers(headers)
}
