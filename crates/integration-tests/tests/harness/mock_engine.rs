//! Mock synthesis service for the HTTP engine
//!
//! Answers `POST /synthesize` with a fixed MP3 payload and remembers what it
//! was asked for.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Bytes returned for every successful synthesis
pub const AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00\xff\xfb\x90\x64mock-frames";

/// Request body the gateway sends to the engine
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EngineCall {
    pub text: String,
    pub voice: String,
    pub rate: String,
    pub pitch: String,
}

/// Mock synthesis backend
pub struct MockEngine {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockEngineState>,
}

struct MockEngineState {
    calls: AtomicU32,
    last_call: Mutex<Option<EngineCall>>,
    /// Answer every request with this error instead of audio
    failure: Option<(StatusCode, String)>,
}

impl MockEngine {
    /// Start a mock engine that always succeeds
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(None).await
    }

    /// Start a mock engine that answers every request with `status` and `body`
    pub async fn start_failing(status: StatusCode, body: &str) -> anyhow::Result<Self> {
        Self::start_inner(Some((status, body.to_owned()))).await
    }

    async fn start_inner(failure: Option<(StatusCode, String)>) -> anyhow::Result<Self> {
        let state = Arc::new(MockEngineState {
            calls: AtomicU32::new(0),
            last_call: Mutex::new(None),
            failure,
        });

        let app = Router::new()
            .route("/synthesize", routing::post(handle_synthesize))
            .with_state(Arc::clone(&state));

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

        Ok(Self { addr, shutdown, state })
    }

    /// Endpoint for `[tts.engine] endpoint`
    pub fn endpoint(&self) -> String {
        format!("http://{}/synthesize", self.addr)
    }

    /// Number of synthesis requests received
    pub fn calls(&self) -> u32 {
        self.state.calls.load(Ordering::SeqCst)
    }

    /// Most recent synthesis request
    pub fn last_call(&self) -> Option<EngineCall> {
        self.state.last_call.lock().unwrap().clone()
    }
}

impl Drop for MockEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_synthesize(State(state): State<Arc<MockEngineState>>, Json(call): Json<EngineCall>) -> Response {
    state.calls.fetch_add(1, Ordering::SeqCst);
    *state.last_call.lock().unwrap() = Some(call);

    match &state.failure {
        Some((status, body)) => (*status, body.clone()).into_response(),
        None => ([(axum::http::header::CONTENT_TYPE, "audio/mpeg")], AUDIO).into_response(),
    }
}
