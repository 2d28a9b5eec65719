//! Image generation for a drafted post.

use std::sync::Arc;

use crate::ai::{ImageProvider, ImageRequest};
use crate::error::StageError;

/// Square output size requested for every image.
pub const IMAGE_SIZE: &str = "1024x1024";

/// Fixed seed; identical prompts give identical art.
pub const IMAGE_SEED: u64 = 4_999_999_999;

/// Asks an image model for one picture to accompany the post.
pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    model: String,
}

impl ImageGenerator {
    pub fn new(provider: Arc<dyn ImageProvider>, model: String) -> Self {
        Self { provider, model }
    }

    /// Build the request for a description and the generated post.
    #[must_use]
    pub fn request(description: &str, content: &str) -> ImageRequest {
        ImageRequest {
            prompt: format!("{description}\n\nTweet Content: {content}"),
            size: IMAGE_SIZE.to_string(),
            seed: IMAGE_SEED,
        }
    }

    /// Generate the image and return its URL.
    ///
    /// Failures are [`StageError::ImageFailed`].
    pub async fn generate(&self, description: &str, content: &str) -> Result<String, StageError> {
        let request = Self::request(description, content);

        let urls = self
            .provider
            .generate_image(&self.model, &request)
            .await
            .map_err(|e| StageError::ImageFailed(e.to_string()))?;

        let url = urls
            .into_iter()
            .next()
            .ok_or_else(|| StageError::ImageFailed("response contained no images".to_string()))?;

        tracing::info!(model = %self.model, url = %url, "Generated image");
        Ok(url)
    }
}
