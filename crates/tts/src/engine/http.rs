use std::{path::Path, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tokio::io::AsyncWriteExt;
use url::Url;
use vocalis_config::HttpEngineConfig;

use super::{EngineError, SynthesisEngine, ensure_audio};
use crate::{http_client::client_builder, params::SynthesisRequest};

/// Bodies of failed responses are cut to this many bytes
const ERROR_BODY_LIMIT: usize = 512;

/// Remote synthesis service reached over HTTP
///
/// Sends `{text, voice, rate, pitch}` as JSON and expects MP3 bytes back.
pub struct HttpEngine {
    client: Client,
    endpoint: Url,
    api_key: Option<SecretString>,
    timeout: Duration,
}

impl HttpEngine {
    pub fn new(config: &HttpEngineConfig) -> Result<Self, EngineError> {
        let client = client_builder()
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout.get(),
        })
    }
}

#[derive(serde::Serialize)]
struct EngineRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: &'a str,
    pitch: &'a str,
}

#[async_trait]
impl SynthesisEngine for HttpEngine {
    async fn synthesize(&self, request: &SynthesisRequest, output: &Path) -> Result<(), EngineError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            voice = request.voice(),
            text_len = request.text().len(),
            "HTTP synthesis request"
        );

        let body = EngineRequest {
            text: request.text(),
            voice: request.voice(),
            rate: request.rate(),
            pitch: request.pitch(),
        };

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(&body);

        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        let mut response = builder.send().await.map_err(|e| self.transport_error(&e))?;

        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!("synthesis endpoint error ({status}): {text}");

            return Err(EngineError::Upstream {
                status: status.as_u16(),
                body: truncate(text, ERROR_BODY_LIMIT),
            });
        }

        let mut file = tokio::fs::File::create(output).await?;

        while let Some(chunk) = response.chunk().await.map_err(|e| self.transport_error(&e))? {
            file.write_all(&chunk).await?;
        }

        file.flush().await?;
        drop(file);

        ensure_audio(output).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

impl HttpEngine {
    fn transport_error(&self, e: &reqwest::Error) -> EngineError {
        if e.is_timeout() {
            EngineError::Timeout(self.timeout)
        } else {
            tracing::warn!("synthesis request failed: {e}");
            EngineError::Connection(e.to_string())
        }
    }
}

fn truncate(mut text: String, limit: usize) -> String {
    if text.len() > limit {
        let mut end = limit;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}
