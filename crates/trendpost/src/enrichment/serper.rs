//! Serper web search API client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default search endpoint.
pub const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";

/// One organic search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct OrganicResult {
    /// Result title.
    #[serde(default)]
    pub title: Option<String>,
    /// Result link.
    #[serde(default)]
    pub link: Option<String>,
    /// Short text excerpt.
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Response from the search API.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Organic results in rank order.
    #[serde(default)]
    pub organic: Vec<OrganicResult>,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
}

/// Serper API client.
pub struct SerperClient {
    api_key: Option<String>,
    url: String,
    client: Client,
}

impl SerperClient {
    /// Create a new client.
    pub fn new(api_key: Option<String>, url: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            url: url.into(),
            client,
        })
    }

    /// Whether an API key is available.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run one search query.
    pub async fn search(&self, query: &str) -> ClientResult<SearchResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ClientError::NotConfigured("SERPER_API_KEY not set".to_string()))?;

        let response = self
            .client
            .post(&self.url)
            .header("X-API-KEY", api_key)
            .header("Content-Type", "application/json")
            .json(&SearchRequest { q: query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| ClientError::Parse(format!("search response: {e}")))
    }
}
