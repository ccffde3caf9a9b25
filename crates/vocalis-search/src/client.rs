use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use vocalis_config::SearchConfig;

use crate::error::SearchError;

/// One search result as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    pub url: Option<String>,
    pub content: Option<String>,
}

#[derive(Deserialize)]
struct SearxResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Client for the JSON API of a SearXNG instance
pub struct SearxClient {
    http: reqwest::Client,
    endpoint: Url,
    language: String,
    categories: String,
    timeout: Duration,
}

impl SearxClient {
    /// Create a client for the configured instance
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be extended or the HTTP
    /// client cannot be built
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().user_agent(&config.user_agent).build()?;

        let mut endpoint = config.base_url.clone();
        endpoint
            .path_segments_mut()
            .map_err(|()| anyhow::anyhow!("search base_url cannot be a base: {}", config.base_url))?
            .pop_if_empty()
            .push("search");

        Ok(Self {
            http,
            endpoint,
            language: config.language.clone(),
            categories: config.categories.clone(),
            timeout: config.timeout.get(),
        })
    }

    /// Run `query` and return at most `limit` hits
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        tracing::debug!(endpoint = %self.endpoint, "SearXNG request");

        let response = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("q", query),
                ("format", "json"),
                ("language", self.language.as_str()),
                ("categories", self.categories.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("search request failed: {e}");
                SearchError::Upstream(e.to_string())
            })?;

        let status = response.status();

        if !status.is_success() {
            tracing::warn!("search backend returned {status}");
            return Err(SearchError::Upstream(format!("search backend returned {status}")));
        }

        let body: SearxResponse = response.json().await.map_err(|e| {
            tracing::warn!("failed to parse search response: {e}");
            SearchError::Upstream(format!("failed to parse search response: {e}"))
        })?;

        let mut hits = body.results;
        hits.truncate(limit);

        Ok(hits)
    }
}
