#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod artifact;
pub mod engine;
mod error;
mod http_client;
pub mod params;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    response::{IntoResponse, Response},
    routing::get,
};
use vocalis_config::Config;
use vocalis_core::ClientIdentity;
use vocalis_ratelimit::RequestLimiter;

pub use artifact::{ArtifactStore, AudioArtifact, SweepReport};
pub use engine::{EngineError, SynthesisEngine};
pub use error::{Result, TtsError};
pub use params::{SynthesisRequest, ValidationError, VoicePolicy};
pub use server::{Gateway, GatewayBuilder};
pub use types::{AudioResponse, StatusResponse, TtsQuery, VoicesResponse};

/// Build the synthesis gateway from configuration
pub fn build_server(config: &Config, limiter: Arc<RequestLimiter>) -> anyhow::Result<Arc<Gateway>> {
    let gateway = Arc::new(
        GatewayBuilder::new(&config.tts, limiter)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize TTS gateway: {e}"))?,
    );
    Ok(gateway)
}

/// Create the endpoint router for synthesis
pub fn endpoint_router() -> Router<Arc<Gateway>> {
    Router::new()
        .route("/", get(status))
        .route("/voices", get(voices))
        .route("/tts", get(synthesize))
}

async fn status(State(gateway): State<Arc<Gateway>>) -> Response {
    Json(StatusResponse {
        status: "running",
        voices: gateway.policy().voices(),
    })
    .into_response()
}

async fn voices(State(gateway): State<Arc<Gateway>>) -> Response {
    Json(VoicesResponse {
        voices: gateway.policy().voices(),
    })
    .into_response()
}

/// Handle synthesis requests
async fn synthesize(
    State(gateway): State<Arc<Gateway>>,
    client: ClientIdentity,
    RawQuery(query): RawQuery,
) -> Result<AudioResponse> {
    let query = TtsQuery::parse(query.as_deref());

    tracing::debug!(%client, voice = ?query.voice, "TTS handler called");

    gateway.synthesize(&client, query).await
}
