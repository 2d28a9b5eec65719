//! Trend selection using a text model.

use anyhow::Result;
use serde::Deserialize;
use std::sync::Arc;

use crate::ai::{parse_ai_response, AIMessage, AIProvider, GenerateOptions};
use crate::token::TokenProfile;
use crate::trends::TrendItem;

use super::prompts::{PromptManager, SELECTION_TEMPLATE_NAME};

/// Explanation shown when the model's pick could not be used.
pub const FALLBACK_EXPLANATION: &str = "Error occurred during selection explanation";

/// Outcome of trend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The model picked a listed trend.
    Selected {
        trend: TrendItem,
        explanation: String,
    },
    /// The model answer was unusable; the first listed trend stands in.
    Fallback { trend: TrendItem, reason: String },
    /// No trends were supplied, so nothing can be selected.
    Rejected { reason: String },
}

impl Selection {
    /// The chosen trend, if any.
    #[must_use]
    pub fn trend(&self) -> Option<&TrendItem> {
        match self {
            Self::Selected { trend, .. } | Self::Fallback { trend, .. } => Some(trend),
            Self::Rejected { .. } => None,
        }
    }

    /// Display text explaining the pick.
    #[must_use]
    pub fn explanation(&self) -> &str {
        match self {
            Self::Selected { explanation, .. } => explanation,
            Self::Fallback { .. } => FALLBACK_EXPLANATION,
            Self::Rejected { reason } => reason,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Debug, Deserialize)]
struct RawSelection {
    selected_trend: String,
    explanation: String,
}

/// Asks a text model to pick the trend that best fits a token.
pub struct TrendSelector {
    provider: Arc<dyn AIProvider>,
    prompts: PromptManager,
    model: String,
}

impl TrendSelector {
    /// Create a selector backed by the given provider.
    pub fn new(provider: Arc<dyn AIProvider>, model: String) -> Result<Self> {
        let prompts = PromptManager::new()?;
        Ok(Self {
            provider,
            prompts,
            model,
        })
    }

    /// Sampling options for selection: low temperature, short JSON answer.
    #[must_use]
    pub fn options() -> GenerateOptions {
        GenerateOptions {
            temperature: Some(0.3),
            max_tokens: Some(200),
            json_mode: true,
            ..Default::default()
        }
    }

    /// Choose one trend from `trends` for the token.
    ///
    /// Never returns a trend outside `trends`. An empty list is `Rejected`.
    pub async fn select(&self, trends: &[TrendItem], token: &TokenProfile) -> Selection {
        let Some(first) = trends.first() else {
            return Selection::Rejected {
                reason: "no trends to select from".to_string(),
            };
        };

        match self.ask(trends, token).await {
            Ok(raw) => resolve(trends, raw, first),
            Err(e) => {
                tracing::warn!(error = %e, fallback = %first, "Trend selection failed");
                Selection::Fallback {
                    trend: first.clone(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn ask(&self, trends: &[TrendItem], token: &TokenProfile) -> Result<RawSelection> {
        let trend_list = trends
            .iter()
            .map(TrendItem::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        let prompt = self.prompts.render(
            SELECTION_TEMPLATE_NAME,
            &serde_json::json!({
                "trends": trend_list,
                "token_name": token.name,
                "token_description": token.description,
            }),
        )?;

        let response = self
            .provider
            .generate_text(&self.model, &[AIMessage::user(prompt)], &Self::options())
            .await?;

        Ok(parse_ai_response(&response)?)
    }
}

/// Map the model's answer onto the supplied list.
fn resolve(trends: &[TrendItem], raw: RawSelection, first: &TrendItem) -> Selection {
    let picked = trends
        .iter()
        .find(|t| t.as_str() == raw.selected_trend)
        .or_else(|| trends.iter().find(|t| t.matches(&raw.selected_trend)));

    match picked {
        Some(trend) => {
            tracing::info!(trend = %trend, "Model selected trend");
            Selection::Selected {
                trend: trend.clone(),
                explanation: raw.explanation,
            }
        }
        None => {
            tracing::warn!(
                answer = %raw.selected_trend,
                fallback = %first,
                "Model picked a trend outside the list"
            );
            Selection::Fallback {
                trend: first.clone(),
                reason: format!("model picked unlisted trend '{}'", raw.selected_trend),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::ScriptedProvider;

    fn trends() -> Vec<TrendItem> {
        vec![TrendItem::new("#AI"), TrendItem::new("#Web3")]
    }

    fn token() -> TokenProfile {
        TokenProfile::new(
            "LEGENDARY HUMANITY",
            "Merging fashion, art, and #AI into #Web3 assets.",
        )
    }

    fn selector(provider: &Arc<ScriptedProvider>) -> TrendSelector {
        TrendSelector::new(provider.clone(), "test-model".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_selects_listed_trend() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            r##"{"selected_trend": "#Web3", "explanation": "Web3 is the token's home turf."}"##,
        )]));

        let selection = selector(&provider).select(&trends(), &token()).await;

        assert_eq!(
            selection,
            Selection::Selected {
                trend: TrendItem::new("#Web3"),
                explanation: "Web3 is the token's home turf.".to_string(),
            }
        );

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0].0[0].content;
        assert!(prompt.contains("#AI, #Web3"));
        assert!(prompt.contains("LEGENDARY HUMANITY"));
        assert_eq!(calls[0].1, TrendSelector::options());
    }

    #[tokio::test]
    async fn test_tolerant_match_returns_listed_item() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            r#"{"selected_trend": "ai", "explanation": "AI fits."}"#,
        )]));

        let selection = selector(&provider).select(&trends(), &token()).await;
        assert_eq!(selection.trend(), Some(&TrendItem::new("#AI")));
        assert!(!selection.is_fallback());
    }

    #[tokio::test]
    async fn test_invalid_json_falls_back_to_first() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok("I like #Web3 best")]));

        let selection = selector(&provider).select(&trends(), &token()).await;

        assert!(selection.is_fallback());
        assert_eq!(selection.trend(), Some(&TrendItem::new("#AI")));
        assert!(selection
            .explanation()
            .to_lowercase()
            .starts_with("error occurred during selection"));
    }

    #[tokio::test]
    async fn test_missing_field_falls_back() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            r##"{"selected_trend": "#Web3"}"##,
        )]));

        let selection = selector(&provider).select(&trends(), &token()).await;
        assert_eq!(selection.trend(), Some(&TrendItem::new("#AI")));
        assert_eq!(selection.explanation(), FALLBACK_EXPLANATION);
    }

    #[tokio::test]
    async fn test_request_failure_falls_back() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Err("upstream overloaded")]));

        let selection = selector(&provider).select(&trends(), &token()).await;
        match selection {
            Selection::Fallback { trend, reason } => {
                assert_eq!(trend.as_str(), "#AI");
                assert!(reason.contains("upstream overloaded"));
            }
            other => panic!("expected fallback, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unlisted_pick_falls_back() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            r##"{"selected_trend": "#Moon", "explanation": "Moon!"}"##,
        )]));

        let selection = selector(&provider).select(&trends(), &token()).await;
        assert!(selection.is_fallback());
        assert!(trends().contains(selection.trend().unwrap()));
    }

    #[tokio::test]
    async fn test_empty_list_is_rejected_without_calling_model() {
        let provider = Arc::new(ScriptedProvider::default());

        let selection = selector(&provider).select(&[], &token()).await;

        assert!(matches!(selection, Selection::Rejected { .. }));
        assert!(selection.trend().is_none());
        assert!(provider.calls().is_empty());
    }
}
