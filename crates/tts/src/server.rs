use std::{sync::Arc, time::Duration, time::Instant};

use vocalis_config::TtsConfig;
use vocalis_core::ClientIdentity;
use vocalis_ratelimit::RequestLimiter;
use vocalis_telemetry::{Counter, Histogram, KeyValue, metrics};

use crate::{
    artifact::ArtifactStore,
    engine::{self, SynthesisEngine},
    error::{Result, TtsError},
    params::VoicePolicy,
    types::{AudioResponse, TtsQuery},
};

const DEFAULT_RATE: &str = "+0%";
const DEFAULT_PITCH: &str = "+0Hz";

/// Synthesis-on-demand pipeline behind `GET /tts`
///
/// A request moves through validation, the client throttle, an artifact
/// sweep, allocation and the engine call, and is answered with a stream
/// over the artifact file. Validation runs first so a malformed request
/// never costs the client its throttle slot.
pub struct Gateway {
    policy: VoicePolicy,
    limiter: Arc<RequestLimiter>,
    store: ArtifactStore,
    max_age: Duration,
    engine: Arc<dyn SynthesisEngine>,
    requests: Counter<u64>,
    engine_duration: Histogram<f64>,
}

impl Gateway {
    pub const fn policy(&self) -> &VoicePolicy {
        &self.policy
    }

    pub const fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run one synthesis request end to end
    pub async fn synthesize(&self, client: &ClientIdentity, query: TtsQuery) -> Result<AudioResponse> {
        let request = self
            .policy
            .normalize(
                query.text.as_deref().unwrap_or_default(),
                query.voice.as_deref().unwrap_or(self.policy.default_voice()),
                query.rate.as_deref().unwrap_or(DEFAULT_RATE),
                query.pitch.as_deref().unwrap_or(DEFAULT_PITCH),
            )
            .inspect_err(|e| {
                tracing::debug!(%client, "rejected synthesis request: {e}");
                self.count("invalid");
            })?;

        self.limiter
            .check_client(client.as_str())
            .inspect_err(|_| self.count("throttled"))?;

        self.sweep().await;

        let artifact = self.store.allocate();
        let start = Instant::now();

        let result = self.engine.synthesize(&request, artifact.path()).await;

        metrics::record_duration(
            &self.engine_duration,
            start,
            &[KeyValue::new("engine", self.engine.name().to_string())],
        );

        // On failure the artifact stays indexed and the next sweep reclaims it
        if let Err(e) = result {
            tracing::warn!(%client, id = %artifact.id(), voice = request.voice(), "synthesis failed: {e}");
            self.count("engine_error");
            return Err(TtsError::Engine(e));
        }

        let file = tokio::fs::File::open(artifact.path()).await.map_err(|e| {
            self.count("engine_error");
            TtsError::Artifact(e)
        })?;

        tracing::debug!(%client, id = %artifact.id(), voice = request.voice(), "synthesis complete");
        self.count("ok");

        Ok(AudioResponse::new(file, self.store.clone(), artifact))
    }

    async fn sweep(&self) {
        let store = self.store.clone();
        let max_age = self.max_age;

        if let Err(e) = tokio::task::spawn_blocking(move || store.sweep_expired(max_age)).await {
            tracing::warn!("artifact sweep aborted: {e}");
        }
    }

    fn count(&self, outcome: &'static str) {
        self.requests.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Builder for constructing the gateway from configuration
pub struct GatewayBuilder<'a> {
    config: &'a TtsConfig,
    limiter: Arc<RequestLimiter>,
    engine: Option<Arc<dyn SynthesisEngine>>,
}

impl<'a> GatewayBuilder<'a> {
    pub const fn new(config: &'a TtsConfig, limiter: Arc<RequestLimiter>) -> Self {
        Self {
            config,
            limiter,
            engine: None,
        }
    }

    /// Use `engine` instead of the configured one
    #[must_use]
    pub fn engine(mut self, engine: Arc<dyn SynthesisEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn build(self) -> Result<Gateway> {
        let engine = match self.engine {
            Some(engine) => engine,
            None => engine::from_config(&self.config.engine)?,
        };

        let artifacts = &self.config.artifacts;
        let store = ArtifactStore::open(&artifacts.directory, artifacts.rescan_interval.get()).map_err(|e| {
            TtsError::Config(format!(
                "cannot open artifact directory {}: {e}",
                artifacts.directory.display()
            ))
        })?;

        tracing::debug!(
            directory = %store.directory().display(),
            engine = engine.name(),
            voices = self.config.allowed_voices.len(),
            "TTS gateway initialized"
        );

        Ok(Gateway {
            policy: VoicePolicy::from_config(self.config),
            limiter: self.limiter,
            store,
            max_age: artifacts.max_age.get(),
            engine,
            requests: metrics::counter(metrics::TTS_REQUEST_COUNT),
            engine_duration: metrics::duration_histogram(metrics::TTS_ENGINE_DURATION),
        })
    }
}
