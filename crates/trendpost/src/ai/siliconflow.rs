//! SiliconFlow provider: OpenAI-compatible chat completions plus image generation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

use super::provider::{
    AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, ImageProvider, ImageRequest,
};

/// Default API base
pub const SILICONFLOW_API_BASE: &str = "https://api.siliconflow.cn/v1";

/// Default text model
pub const DEFAULT_TEXT_MODEL: &str = "Qwen/Qwen2.5-Coder-32B-Instruct";

/// Default image model
pub const DEFAULT_IMAGE_MODEL: &str = "black-forest-labs/FLUX.1-schnell";

const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    image_size: &'a str,
    seed: u64,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    images: Vec<GeneratedImage>,
}

/// Error body shapes the API uses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<NestedError>,
}

#[derive(Debug, Deserialize)]
struct NestedError {
    message: String,
}

/// SiliconFlow client for chat and image endpoints.
pub struct SiliconFlowProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl SiliconFlowProvider {
    /// Create a provider. A missing or blank key is not an error here;
    /// calls fail with `NotConfigured`.
    pub fn new(api_key: Option<String>) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: SILICONFLOW_API_BASE.to_string(),
        })
    }

    /// Set a custom base URL (proxies, other OpenAI-compatible hosts, tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn api_key(&self) -> ClientResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ClientError::NotConfigured("SILICONFLOW_API_KEY not set".to_string()))
    }

    fn convert_messages(messages: &[AIMessage]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    AIRole::System => "system".to_string(),
                    AIRole::User => "user".to_string(),
                    AIRole::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    fn build_chat_request(
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> ChatRequest {
        let response_format = options.json_mode.then(|| ResponseFormat {
            format_type: "json_object".to_string(),
        });

        ChatRequest {
            model: model.to_string(),
            messages: Self::convert_messages(messages),
            stream: false,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            top_p: options.top_p,
            top_k: options.top_k,
            frequency_penalty: options.frequency_penalty,
            n: options.n,
            stop: options.stop_sequences.clone(),
            response_format,
        }
    }

    /// POST a JSON body and return the raw success body.
    async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> ClientResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}{path}", self.base_url);

        tracing::debug!(url = %url, "POST request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|e| e.error.map(|n| n.message).or(e.message))
                .unwrap_or(body);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl AIProvider for SiliconFlowProvider {
    fn name(&self) -> &'static str {
        "siliconflow"
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> ClientResult<AIResponse> {
        let request = Self::build_chat_request(model, messages, options);
        let body = self.post_json("/chat/completions", &request).await?;

        let api_response: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("chat completion: {e}")))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ClientError::Parse("chat completion has no choices[0].message.content".into()))?;

        Ok(AIResponse {
            text,
            model: api_response.model.unwrap_or_else(|| model.to_string()),
        })
    }
}

#[async_trait]
impl ImageProvider for SiliconFlowProvider {
    fn name(&self) -> &'static str {
        "siliconflow"
    }

    async fn generate_image(
        &self,
        model: &str,
        request: &ImageRequest,
    ) -> ClientResult<Vec<String>> {
        let payload = ImageGenerationRequest {
            model,
            prompt: &request.prompt,
            image_size: &request.size,
            seed: request.seed,
        };
        let body = self.post_json("/image/generations", &payload).await?;

        let api_response: ImageGenerationResponse = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("image generation: {e}")))?;

        Ok(api_response.images.into_iter().map(|i| i.url).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            AIMessage {
                role: AIRole::System,
                content: "You pick trends".to_string(),
            },
            AIMessage::user("Hello"),
        ];
        let converted = SiliconFlowProvider::convert_messages(&messages);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn test_chat_request_omits_unset_sampling() {
        let options = GenerateOptions {
            temperature: Some(0.3),
            max_tokens: Some(200),
            json_mode: true,
            ..Default::default()
        };
        let request = SiliconFlowProvider::build_chat_request(
            DEFAULT_TEXT_MODEL,
            &[AIMessage::user("pick")],
            &options,
        );
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["stream"], false);
        assert_eq!(value["max_tokens"], 200);
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!(value.get("top_k").is_none());
        assert!(value.get("stop").is_none());
    }

    #[test]
    fn test_chat_request_full_sampling() {
        let options = GenerateOptions {
            temperature: Some(0.7),
            top_p: Some(0.7),
            top_k: Some(50),
            frequency_penalty: Some(0.5),
            n: Some(1),
            max_tokens: Some(512),
            stop_sequences: Some(vec!["<string>".to_string()]),
            json_mode: false,
        };
        let request =
            SiliconFlowProvider::build_chat_request("m", &[AIMessage::user("write")], &options);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["top_k"], 50);
        assert_eq!(value["n"], 1);
        assert_eq!(value["stop"][0], "<string>");
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_blank_key_is_unconfigured() {
        let provider = SiliconFlowProvider::new(Some("  ".to_string())).unwrap();
        assert!(!AIProvider::is_configured(&provider));
        assert!(matches!(
            provider.api_key(),
            Err(ClientError::NotConfigured(_))
        ));
    }
}
