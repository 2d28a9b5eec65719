//! Minimal posting client: create one post as the authenticated user.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

use super::oauth::OAuthSigner;

/// Default platform API base.
pub const TWITTER_API_BASE: &str = "https://api.twitter.com";

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: Option<CreatedTweet>,
}

#[derive(Debug, Deserialize)]
struct ApiProblem {
    message: Option<String>,
}

/// Error bodies come either as v2 problems or legacy error lists.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
    title: Option<String>,
    #[serde(default)]
    errors: Vec<ApiProblem>,
}

impl ErrorBody {
    fn message(self) -> Option<String> {
        self.detail
            .or_else(|| self.errors.into_iter().find_map(|e| e.message))
            .or(self.title)
    }
}

/// Authenticated handle for the posting API.
pub struct TwitterClient {
    client: Client,
    signer: OAuthSigner,
    api_base: String,
}

impl TwitterClient {
    /// Create a client that signs every request with `signer`.
    pub fn new(signer: OAuthSigner, api_base: impl Into<String>) -> ClientResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            signer,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a post and return its id.
    pub async fn create_tweet(&self, text: &str) -> ClientResult<String> {
        let url = format!("{}/2/tweets", self.api_base);
        let authorization = self.signer.authorization_header("POST", &url, &[])?;

        let response = self
            .client
            .post(&url)
            .header("Authorization", authorization)
            .json(&CreateTweetRequest { text })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(ErrorBody::message)
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: CreateTweetResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("create post response: {e}")))?;

        parsed
            .data
            .map(|d| d.id)
            .ok_or_else(|| ClientError::Parse("create post response had no data.id".to_string()))
    }
}
