//! Shared fixtures for the integration tests
//!
//! Each test binary uses a different subset, hence the blanket allow.

#![allow(dead_code)]

pub mod config;
pub mod mock_engine;
pub mod mock_search;
pub mod server;

use std::time::Duration;

/// Poll `condition` until it holds or `timeout` passes
pub async fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
