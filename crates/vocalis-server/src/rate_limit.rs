use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use vocalis_ratelimit::RequestLimiter;

/// Global request budget, checked before any handler runs
///
/// The per-client throttle is applied by the handlers themselves, after
/// request validation.
pub async fn rate_limit_middleware(limiter: Arc<RequestLimiter>, request: Request, next: Next) -> Response {
    if let Err(e) = limiter.check_global() {
        tracing::debug!(path = %request.uri().path(), "global rate limit exceeded");
        return vocalis_core::error_response(&e);
    }

    next.run(request).await
}
