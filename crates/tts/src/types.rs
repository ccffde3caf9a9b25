use axum::{
    body::Body,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use http::{HeaderValue, header};
use serde::Serialize;
use tokio_util::io::ReaderStream;
use url::form_urlencoded;

use crate::artifact::{ArtifactStore, AudioArtifact};

/// Query string of `GET /tts`
///
/// Every field is optional; missing text is treated as empty text and the
/// rest fall back to their defaults. Values are form-decoded, so `+` reads
/// as a space and `%2B` as a literal plus.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TtsQuery {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub rate: Option<String>,
    pub pitch: Option<String>,
}

impl TtsQuery {
    /// Parse a raw query string; the first occurrence of a key wins
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "text" => &mut query.text,
                "voice" => &mut query.voice,
                "rate" => &mut query.rate,
                "pitch" => &mut query.pitch,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        query
    }
}

/// Body of `GET /`
#[derive(Debug, Serialize)]
pub struct StatusResponse<'a> {
    pub status: &'static str,
    pub voices: &'a [String],
}

/// Body of `GET /voices`
#[derive(Debug, Serialize)]
pub struct VoicesResponse<'a> {
    pub voices: &'a [String],
}

/// Synthesized audio, streamed from its artifact file
///
/// The artifact is released when the body is dropped: after the last chunk
/// is sent, or earlier if the client goes away.
pub struct AudioResponse {
    file: tokio::fs::File,
    guard: ReleaseGuard,
}

impl AudioResponse {
    pub(crate) const fn new(file: tokio::fs::File, store: ArtifactStore, artifact: AudioArtifact) -> Self {
        Self {
            file,
            guard: ReleaseGuard { store, artifact },
        }
    }
}

impl IntoResponse for AudioResponse {
    fn into_response(self) -> Response {
        let Self { file, guard } = self;

        let stream = ReaderStream::new(file).map(move |chunk| {
            let _ = &guard;
            chunk
        });

        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg")),
                (header::CONTENT_DISPOSITION, HeaderValue::from_static("inline")),
                (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
                (header::PRAGMA, HeaderValue::from_static("no-cache")),
            ],
            Body::from_stream(stream),
        )
            .into_response()
    }
}

struct ReleaseGuard {
    store: ArtifactStore,
    artifact: AudioArtifact,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        self.store.release(&self.artifact);
    }
}
