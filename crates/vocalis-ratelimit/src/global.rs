use std::{num::NonZeroU32, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
};

use crate::error::RateLimitError;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Process-wide request budget shared by every client, backed by governor
pub struct GlobalLimiter {
    limiter: DirectLimiter,
    clock: DefaultClock,
}

impl GlobalLimiter {
    /// Allow `max_requests` per `window`, with the full budget available as a burst
    pub fn new(max_requests: u32, window: Duration) -> Result<Self, RateLimitError> {
        if window.is_zero() {
            return Err(RateLimitError::Config("rate limit window must be > 0".to_string()));
        }

        let burst = NonZeroU32::new(max_requests)
            .ok_or_else(|| RateLimitError::Config("max_requests must be > 0".to_string()))?;

        let quota = Quota::with_period(window / burst.get())
            .ok_or_else(|| RateLimitError::Config("invalid rate limit period".to_string()))?
            .allow_burst(burst);

        Ok(Self {
            limiter: RateLimiter::direct(quota),
            clock: DefaultClock::default(),
        })
    }

    pub fn check(&self) -> Result<(), RateLimitError> {
        self.limiter.check().map_err(|not_until| RateLimitError::Exceeded {
            retry_after: not_until.wait_time_from(self.clock.now()).as_secs().max(1),
        })
    }
}
