//! Web search with a memoizing knowledge cache
//!
//! Answers `GET /search` from a SearXNG instance and keeps recent answers
//! for a configurable time so repeated questions are served locally.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod client;
mod error;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use mini_moka::sync::Cache;
use serde::{Deserialize, Serialize};
use vocalis_config::SearchConfig;
use vocalis_core::ClientIdentity;
use vocalis_ratelimit::RequestLimiter;
use vocalis_telemetry::{Counter, KeyValue, metrics};

pub use client::{SearchHit, SearxClient};
pub use error::SearchError;

/// Query string of `GET /search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<String>,
}

/// Body of a successful `GET /search`
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// Search backend plus answer cache
pub struct SearchService {
    client: SearxClient,
    limiter: Arc<RequestLimiter>,
    cache: Cache<(String, usize), Arc<Vec<SearchHit>>>,
    default_limit: usize,
    max_limit: usize,
    requests: Counter<u64>,
    cache_hits: Counter<u64>,
}

impl SearchService {
    pub fn new(config: &SearchConfig, limiter: Arc<RequestLimiter>) -> anyhow::Result<Self> {
        let cache = Cache::builder()
            .time_to_live(config.cache_ttl.get())
            .max_capacity(config.cache_capacity)
            .build();

        Ok(Self {
            client: SearxClient::new(config)?,
            limiter,
            cache,
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            requests: metrics::counter(metrics::SEARCH_REQUEST_COUNT),
            cache_hits: metrics::counter(metrics::SEARCH_CACHE_HITS),
        })
    }

    /// Answer one search request
    ///
    /// The query is checked before the throttle so an empty query does not
    /// cost the client its slot.
    pub async fn search(&self, client: &ClientIdentity, params: SearchParams) -> Result<SearchResponse, SearchError> {
        let query = params.q.as_deref().map(str::trim).unwrap_or_default();

        if query.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let limit = self.resolve_limit(params.limit.as_deref())?;

        self.limiter.check_client(client.as_str())?;

        let key = (query.to_lowercase(), limit);

        if let Some(results) = self.cache.get(&key) {
            self.cache_hits.add(1, &[]);
            self.requests.add(1, &[KeyValue::new("outcome", "cached")]);
            tracing::debug!(%client, "search answered from cache");

            return Ok(SearchResponse {
                query: query.to_string(),
                results: results.as_ref().clone(),
            });
        }

        let results = match self.client.search(query, limit).await {
            Ok(hits) => hits,
            Err(e) => {
                self.requests.add(1, &[KeyValue::new("outcome", "upstream_error")]);
                return Err(e);
            }
        };

        self.cache.insert(key, Arc::new(results.clone()));
        self.requests.add(1, &[KeyValue::new("outcome", "ok")]);
        tracing::debug!(%client, hits = results.len(), "search complete");

        Ok(SearchResponse {
            query: query.to_string(),
            results,
        })
    }

    fn resolve_limit(&self, raw: Option<&str>) -> Result<usize, SearchError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(self.default_limit),
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => Err(SearchError::InvalidLimit),
                Ok(limit) => Ok(limit.min(self.max_limit)),
            },
        }
    }
}

/// Build the search service when `[search]` is configured
pub fn build_server(config: &SearchConfig, limiter: Arc<RequestLimiter>) -> anyhow::Result<Arc<SearchService>> {
    let service = SearchService::new(config, limiter)
        .map_err(|e| anyhow::anyhow!("Failed to initialize search: {e}"))?;

    tracing::debug!(base_url = %config.base_url, "search initialized");

    Ok(Arc::new(service))
}

/// Create the endpoint router for search
pub fn endpoint_router() -> Router<Arc<SearchService>> {
    Router::new().route("/search", get(search))
}

async fn search(
    State(service): State<Arc<SearchService>>,
    client: ClientIdentity,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, SearchError> {
    service.search(&client, params).await.map(Json)
}
