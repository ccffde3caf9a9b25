use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of a throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Throttled {
        /// Time until this client's slot frees up
        retry_after: Duration,
    },
}

/// Per-client pacing with a single last-accepted timestamp per key
///
/// A client gets at most one accepted request per `min_interval`. Rejected
/// requests leave the timestamp untouched, so a client hammering the
/// gateway is freed exactly `min_interval` after its last accepted call.
///
/// The check-then-record step runs under the map's entry lock, which makes
/// it atomic for concurrent requests from the same client. Entries older
/// than `min_interval` carry no information and are dropped by [`prune`],
/// either on a timer or eagerly once `max_clients` is reached.
///
/// [`prune`]: ClientThrottle::prune
#[derive(Debug)]
pub struct ClientThrottle {
    min_interval: Duration,
    max_clients: usize,
    last_accepted: DashMap<String, Instant>,
}

impl ClientThrottle {
    pub fn new(min_interval: Duration, max_clients: usize) -> Self {
        Self {
            min_interval,
            max_clients: max_clients.max(1),
            last_accepted: DashMap::new(),
        }
    }

    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Accept and record `now`, or reject without recording
    pub fn check_and_record(&self, client_id: &str, now: Instant) -> Decision {
        if self.last_accepted.len() >= self.max_clients && !self.last_accepted.contains_key(client_id) {
            let dropped = self.prune(now);
            tracing::debug!(dropped, "throttle map reached capacity, pruned stale clients");
        }

        match self.last_accepted.entry(client_id.to_string()) {
            Entry::Occupied(mut entry) => {
                let elapsed = now.saturating_duration_since(*entry.get());

                if elapsed < self.min_interval {
                    return Decision::Throttled {
                        retry_after: self.min_interval - elapsed,
                    };
                }

                entry.insert(now);
                Decision::Allowed
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Decision::Allowed
            }
        }
    }

    /// Drop clients whose last accepted request is at least `min_interval` old
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self, now: Instant) -> usize {
        let before = self.last_accepted.len();

        self.last_accepted
            .retain(|_, last| now.saturating_duration_since(*last) < self.min_interval);

        before.saturating_sub(self.last_accepted.len())
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.last_accepted.len()
    }

    /// Prune on a fixed period until `shutdown` fires
    pub fn spawn_pruner(self: &Arc<Self>, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let throttle = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let dropped = throttle.prune(Instant::now());
                        if dropped > 0 {
                            tracing::debug!(dropped, remaining = throttle.tracked_clients(), "pruned throttle map");
                        }
                    }
                }
            }
        })
    }
}
