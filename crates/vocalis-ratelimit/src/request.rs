use std::{sync::Arc, time::Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vocalis_config::RateLimitConfig;

use crate::{
    error::RateLimitError,
    global::GlobalLimiter,
    throttle::{ClientThrottle, Decision},
};

/// HTTP request-level limiter: optional global budget plus per-client pacing
pub struct RequestLimiter {
    global: Option<GlobalLimiter>,
    per_client: Arc<ClientThrottle>,
    prune_interval: std::time::Duration,
}

impl RequestLimiter {
    /// Create from configuration
    pub fn new(config: &RateLimitConfig) -> Result<Self, RateLimitError> {
        let global = config
            .global
            .as_ref()
            .map(|rl| GlobalLimiter::new(rl.requests, rl.window.get()))
            .transpose()?;

        let per_client = Arc::new(ClientThrottle::new(config.min_interval.get(), config.max_clients));

        Ok(Self {
            global,
            per_client,
            prune_interval: config.prune_interval.get(),
        })
    }

    /// Check the global budget, if one is configured
    pub fn check_global(&self) -> Result<(), RateLimitError> {
        match self.global {
            Some(ref limiter) => limiter.check(),
            None => Ok(()),
        }
    }

    /// Check and consume the client's throttle slot
    pub fn check_client(&self, client_id: &str) -> Result<(), RateLimitError> {
        match self.per_client.check_and_record(client_id, Instant::now()) {
            Decision::Allowed => Ok(()),
            Decision::Throttled { retry_after } => {
                tracing::debug!(client = client_id, ?retry_after, "client throttled");

                // Round up so the hint is never earlier than the slot frees
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                Err(RateLimitError::Exceeded {
                    retry_after: secs.max(1),
                })
            }
        }
    }

    /// Start the background task that bounds the per-client map
    pub fn spawn_pruner(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.per_client.spawn_pruner(self.prune_interval, shutdown)
    }

    pub fn client_throttle(&self) -> &Arc<ClientThrottle> {
        &self.per_client
    }
}
