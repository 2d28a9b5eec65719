//! Publishing generated posts to the social platform.
//!
//! Authenticates with a complete OAuth 1.0a credential set, validates the
//! text and submits it as a new public post.

mod oauth;
mod twitter;

pub use oauth::OAuthSigner;
pub use twitter::{TwitterClient, TWITTER_API_BASE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StageError;

/// Character ceiling for one post, counted in Unicode scalar values.
pub const MAX_POST_CHARS: usize = 280;

/// Public URL of a post by id.
#[must_use]
pub fn post_url(id: &str) -> String {
    format!("https://twitter.com/user/status/{id}")
}

/// Check a post before submission.
///
/// Rejects text that is blank after trimming or longer than [`MAX_POST_CHARS`].
pub fn validate_post_text(text: &str) -> Result<(), StageError> {
    if text.trim().is_empty() {
        return Err(StageError::ValidationFailed(
            "post text is empty".to_string(),
        ));
    }

    let chars = text.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(StageError::ValidationFailed(format!(
            "post text is {chars} characters, limit is {MAX_POST_CHARS}"
        )));
    }

    Ok(())
}

/// Platform credentials. All five are required.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub bearer_token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                "<empty>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Credentials")
            .field("consumer_key", &redact(&self.consumer_key))
            .field("consumer_secret", &redact(&self.consumer_secret))
            .field("access_token", &redact(&self.access_token))
            .field("access_token_secret", &redact(&self.access_token_secret))
            .field("bearer_token", &redact(&self.bearer_token))
            .finish()
    }
}

impl Credentials {
    /// Read every field from the environment; unset variables stay empty.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Replace fields with any set, non-blank `TWITTER_*` variables.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let fields: [(&str, &mut String); 5] = [
            ("TWITTER_CONSUMER_KEY", &mut self.consumer_key),
            ("TWITTER_CONSUMER_SECRET", &mut self.consumer_secret),
            ("TWITTER_ACCESS_TOKEN", &mut self.access_token),
            ("TWITTER_ACCESS_TOKEN_SECRET", &mut self.access_token_secret),
            ("TWITTER_BEARER_TOKEN", &mut self.bearer_token),
        ];

        for (var, field) in fields {
            if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }
        self
    }

    /// Names of fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
            ("bearer_token", &self.bearer_token),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

/// A successfully created post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostReceipt {
    pub id: String,
    pub url: String,
    pub posted_at: DateTime<Utc>,
}

/// Authenticates and submits posts.
#[derive(Debug, Clone)]
pub struct Publisher {
    api_base: String,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(TWITTER_API_BASE)
    }
}

impl Publisher {
    /// Create a publisher for an API base URL.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
        }
    }

    /// Build a signed client from a complete credential set.
    ///
    /// Nothing is sent over the network; bad keys surface when posting.
    pub fn authenticate(&self, credentials: &Credentials) -> Result<TwitterClient, StageError> {
        let missing = credentials.missing_fields();
        if !missing.is_empty() {
            return Err(StageError::AuthFailed(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }

        let signer = OAuthSigner::new(
            credentials.consumer_key.trim(),
            credentials.consumer_secret.trim(),
            credentials.access_token.trim(),
            credentials.access_token_secret.trim(),
        );

        let client = TwitterClient::new(signer, self.api_base.clone())
            .map_err(|e| StageError::AuthFailed(e.to_string()))?;

        tracing::debug!(api_base = %self.api_base, "Authenticated posting client");
        Ok(client)
    }

    /// Validate and submit one post.
    ///
    /// Invalid text is [`StageError::ValidationFailed`] and is never sent.
    /// Submission errors are [`StageError::PostFailed`] with the platform's message.
    pub async fn post(&self, client: &TwitterClient, text: &str) -> Result<PostReceipt, StageError> {
        validate_post_text(text)?;

        let id = client
            .create_tweet(text)
            .await
            .map_err(|e| StageError::PostFailed(e.to_string()))?;

        let receipt = PostReceipt {
            url: post_url(&id),
            id,
            posted_at: Utc::now(),
        };

        tracing::info!(id = %receipt.id, url = %receipt.url, "Published post");
        Ok(receipt)
    }

    /// Authenticate and post in one step, outside a pipeline run.
    pub async fn publish(
        &self,
        credentials: &Credentials,
        text: &str,
    ) -> Result<PostReceipt, StageError> {
        let client = self.authenticate(credentials)?;
        self.post(&client, text).await
    }
}
