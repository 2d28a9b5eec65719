//! Post text generation.

use anyhow::Result;
use std::sync::Arc;

use crate::ai::{AIMessage, AIProvider, GenerateOptions};
use crate::error::StageError;
use crate::token::TokenProfile;
use crate::trends::TrendItem;

use super::prompts::PromptManager;

/// Stop sequence sent with every content request.
pub const CONTENT_STOP_SEQUENCE: &str = "<string>";

/// Fills the content template and asks the text model for one post.
pub struct ContentGenerator {
    provider: Arc<dyn AIProvider>,
    prompts: PromptManager,
    model: String,
}

impl ContentGenerator {
    /// Create a generator backed by the given provider.
    pub fn new(provider: Arc<dyn AIProvider>, model: String) -> Result<Self> {
        let prompts = PromptManager::new()?;
        Ok(Self {
            provider,
            prompts,
            model,
        })
    }

    /// Sampling options for content: livelier than selection, one completion.
    #[must_use]
    pub fn options() -> GenerateOptions {
        GenerateOptions {
            temperature: Some(0.7),
            top_p: Some(0.7),
            top_k: Some(50),
            frequency_penalty: Some(0.5),
            n: Some(1),
            max_tokens: Some(512),
            stop_sequences: Some(vec![CONTENT_STOP_SEQUENCE.to_string()]),
            json_mode: true,
        }
    }

    /// Render the prompt for a token, trend and context blob.
    pub fn render_prompt(
        &self,
        template: &str,
        token: &TokenProfile,
        trend: &TrendItem,
        context: &str,
    ) -> Result<String> {
        self.prompts.render_str(
            template,
            &serde_json::json!({
                "token_name": token.name,
                "token_description": token.description,
                "selected_trend": trend.as_str(),
                "context_info": format!("Current Trend Context:\n{context}"),
                "context": context,
            }),
        )
    }

    /// Generate the post text.
    ///
    /// The completion is returned trimmed and unvalidated; length limits are
    /// the publisher's concern.
    pub async fn generate(
        &self,
        template: &str,
        token: &TokenProfile,
        trend: &TrendItem,
        context: &str,
    ) -> Result<String, StageError> {
        let prompt = self
            .render_prompt(template, token, trend, context)
            .map_err(|e| StageError::GenerationFailed(format!("prompt template: {e}")))?;

        let response = self
            .provider
            .generate_text(&self.model, &[AIMessage::user(prompt)], &Self::options())
            .await
            .map_err(|e| StageError::GenerationFailed(e.to_string()))?;

        let content = response.text.trim();
        if content.is_empty() {
            return Err(StageError::GenerationFailed(
                "model returned an empty completion".to_string(),
            ));
        }

        tracing::info!(
            trend = %trend,
            chars = content.chars().count(),
            model = %response.model,
            "Generated post content"
        );
        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedProvider;
    use crate::analysis::DEFAULT_CONTENT_TEMPLATE;

    fn generator(provider: &Arc<ScriptedProvider>) -> ContentGenerator {
        ContentGenerator::new(provider.clone(), "test-model".to_string()).unwrap()
    }

    fn token() -> TokenProfile {
        TokenProfile::new("LEGENDARY HUMANITY", "Merging fashion, art, and #AI")
    }

    #[tokio::test]
    async fn test_generate_trims_and_sends_sampling_options() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            "\n  AI meets fashion 🚀 #AI #VIVI  \n",
        )]));

        let text = generator(&provider)
            .generate(
                DEFAULT_CONTENT_TEMPLATE,
                &token(),
                &TrendItem::new("#AI"),
                "AI is trending today.",
            )
            .await
            .unwrap();

        assert_eq!(text, "AI meets fashion 🚀 #AI #VIVI");

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let (messages, options) = &calls[0];
        assert!(messages[0].content.contains("Selected trend: #AI"));
        assert!(messages[0]
            .content
            .contains("Current Trend Context:\nAI is trending today."));
        assert_eq!(options.top_k, Some(50));
        assert_eq!(options.n, Some(1));
        assert_eq!(
            options.stop_sequences.as_deref(),
            Some(&["<string>".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_empty_context_still_generates() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok("gm #Web3")]));

        let text = generator(&provider)
            .generate(
                "{{token_name}} x {{selected_trend}}: {{context_info}}",
                &token(),
                &TrendItem::new("#Web3"),
                "",
            )
            .await
            .unwrap();

        assert_eq!(text, "gm #Web3");
        assert_eq!(
            provider.calls()[0].0[0].content,
            "LEGENDARY HUMANITY x #Web3: Current Trend Context:\n"
        );
    }

    #[tokio::test]
    async fn test_long_output_is_not_truncated() {
        let long = "x".repeat(400);
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(long.as_str())]));

        let text = generator(&provider)
            .generate(DEFAULT_CONTENT_TEMPLATE, &token(), &TrendItem::new("#AI"), "")
            .await
            .unwrap();
        assert_eq!(text.chars().count(), 400);
    }

    #[tokio::test]
    async fn test_request_failure_is_generation_failed() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Err("bad gateway")]));

        let err = generator(&provider)
            .generate(DEFAULT_CONTENT_TEMPLATE, &token(), &TrendItem::new("#AI"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::GenerationFailed(ref m) if m.contains("bad gateway")));
        assert!(err.is_hard_stop());
    }

    #[tokio::test]
    async fn test_blank_completion_is_generation_failed() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok("   \n")]));

        let err = generator(&provider)
            .generate(DEFAULT_CONTENT_TEMPLATE, &token(), &TrendItem::new("#AI"), "")
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::GenerationFailed(_)));
    }
}
