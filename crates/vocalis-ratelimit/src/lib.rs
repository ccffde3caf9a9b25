#![allow(clippy::missing_errors_doc, clippy::must_use_candidate)]

mod error;
mod global;
mod request;
mod throttle;

pub use error::RateLimitError;
pub use global::GlobalLimiter;
pub use request::RequestLimiter;
pub use throttle::{ClientThrottle, Decision};

use vocalis_config::RateLimitConfig;

/// Create a request limiter from configuration
pub fn create_request_limiter(config: &RateLimitConfig) -> Result<RequestLimiter, RateLimitError> {
    RequestLimiter::new(config)
}
