//! Mock SearXNG instance

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use axum::extract::{Query, State};
use axum::{Json, Router, routing};
use tokio_util::sync::CancellationToken;

/// Mock search backend returning ten canned results per query
pub struct MockSearch {
    addr: SocketAddr,
    shutdown: CancellationToken,
    requests: Arc<AtomicU32>,
}

impl MockSearch {
    pub async fn start() -> anyhow::Result<Self> {
        let requests = Arc::new(AtomicU32::new(0));

        let app = Router::new()
            .route("/search", routing::get(handle_search))
            .with_state(Arc::clone(&requests));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            addr,
            shutdown,
            requests,
        })
    }

    /// Value for `[search] base_url`
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of queries that reached the backend
    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Drop for MockSearch {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_search(
    State(requests): State<Arc<AtomicU32>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    requests.fetch_add(1, Ordering::SeqCst);

    let query = params.get("q").cloned().unwrap_or_default();
    let results: Vec<_> = (1..=10)
        .map(|i| {
            serde_json::json!({
                "title": format!("{query} result {i}"),
                "url": format!("https://example.org/{i}"),
                "content": format!("snippet {i}"),
                "score": 1.0,
            })
        })
        .collect();

    Json(serde_json::json!({ "query": query, "number_of_results": 10, "results": results }))
}
