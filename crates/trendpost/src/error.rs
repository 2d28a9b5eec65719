//! Error types for external clients and pipeline stages.

use std::fmt;

use thiserror::Error;

/// Errors raised by the HTTP collaborators (trend page, search, models, platform).
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// A required key or setting is missing.
    #[error("Not configured: {0}")]
    NotConfigured(String),
}

/// Result alias for client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Trends,
    Context,
    Selection,
    Generation,
    Image,
    Publish,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Input => "run input",
            Stage::Trends => "trend source",
            Stage::Context => "context retriever",
            Stage::Selection => "trend selector",
            Stage::Generation => "content generator",
            Stage::Image => "image generator",
            Stage::Publish => "publisher",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure caught at a stage boundary.
///
/// Every external call is converted into one of these kinds plus the
/// underlying error text before it leaves its stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StageError {
    /// Token name or description is blank. Hard stop before any external call.
    #[error("Please enter token information: {0}")]
    MissingTokenInfo(String),

    /// Trend page unreachable or unparseable. Hard stop.
    #[error("Error fetching trends: {0}")]
    FetchFailed(String),

    /// Context search failed. Soft: the run continues with empty context.
    #[error("Context search error: {0}")]
    SearchFailed(String),

    /// Selection answer unusable. Soft: falls back to the first trend.
    #[error("Trend selection error: {0}")]
    SelectionFailed(String),

    /// Text model failed or answered nothing. Hard stop.
    #[error("Content generation error: {0}")]
    GenerationFailed(String),

    /// Image model failed. Soft: reported, publishing is skipped.
    #[error("Image generation error: {0}")]
    ImageFailed(String),

    /// Credentials missing or unusable. Hard stop for publishing.
    #[error("Authentication error: {0}")]
    AuthFailed(String),

    /// Text empty or over the length ceiling. Hard stop for publishing.
    #[error("Validation error: {0}")]
    ValidationFailed(String),

    /// The platform rejected the submission. Retryable by the caller.
    #[error("Error posting: {0}")]
    PostFailed(String),
}

impl StageError {
    /// The stage this failure belongs to.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::MissingTokenInfo(_) => Stage::Input,
            Self::FetchFailed(_) => Stage::Trends,
            Self::SearchFailed(_) => Stage::Context,
            Self::SelectionFailed(_) => Stage::Selection,
            Self::GenerationFailed(_) => Stage::Generation,
            Self::ImageFailed(_) => Stage::Image,
            Self::AuthFailed(_) | Self::ValidationFailed(_) | Self::PostFailed(_) => {
                Stage::Publish
            }
        }
    }

    /// Short name of the failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingTokenInfo(_) => "MissingTokenInfo",
            Self::FetchFailed(_) => "FetchFailed",
            Self::SearchFailed(_) => "SearchFailed",
            Self::SelectionFailed(_) => "SelectionFailed",
            Self::GenerationFailed(_) => "GenerationFailed",
            Self::ImageFailed(_) => "ImageFailed",
            Self::AuthFailed(_) => "AuthFailed",
            Self::ValidationFailed(_) => "ValidationFailed",
            Self::PostFailed(_) => "PostFailed",
        }
    }

    /// Whether this failure halts every later stage of the run.
    #[must_use]
    pub fn is_hard_stop(&self) -> bool {
        !matches!(
            self,
            Self::SearchFailed(_) | Self::SelectionFailed(_) | Self::ImageFailed(_)
        )
    }

    /// Whether the caller may offer a manual retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PostFailed(_))
    }

    /// The underlying error text without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MissingTokenInfo(m)
            | Self::FetchFailed(m)
            | Self::SearchFailed(m)
            | Self::SelectionFailed(m)
            | Self::GenerationFailed(m)
            | Self::ImageFailed(m)
            | Self::AuthFailed(m)
            | Self::ValidationFailed(m)
            | Self::PostFailed(m) => m,
        }
    }
}
