//! Trend-to-post pipeline: fetch, select, enrich, write, illustrate, publish.

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use crate::ai::{AIProvider, ImageProvider, SiliconFlowProvider};
use crate::analysis::{ContentGenerator, Selection, TrendSelector};
use crate::art::ImageGenerator;
use crate::config::Settings;
use crate::enrichment::{ContextRetriever, SerperClient};
use crate::error::{Stage, StageError};
use crate::publish::{Credentials, PostReceipt, Publisher};
use crate::token::TokenProfile;
use crate::trends::{TrendItem, TrendSource};

/// Where a run stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    TrendsFetched,
    TrendSelected,
    ContentGenerated,
    ImageGenerated,
    Authenticated,
    Posted,
    /// Halted before any content existed, bad input included.
    FetchFailed,
    /// Halted while publishing.
    PostFailed,
}

impl RunState {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Posted | Self::FetchFailed | Self::PostFailed)
    }

    /// Whether `next` directly follows `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use RunState::{
            Authenticated, ContentGenerated, FetchFailed, Idle, ImageGenerated, PostFailed,
            Posted, TrendSelected, TrendsFetched,
        };

        matches!(
            (self, next),
            (Idle, TrendsFetched | FetchFailed)
                | (TrendsFetched, TrendSelected | FetchFailed)
                | (TrendSelected, ContentGenerated | FetchFailed)
                | (ContentGenerated, ImageGenerated | Authenticated | PostFailed)
                | (ImageGenerated, Authenticated | PostFailed)
                | (Authenticated, Posted | PostFailed)
        )
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Everything a single run produced.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub state: RunState,
    pub trends: Vec<TrendItem>,
    pub selection: Option<Selection>,
    /// Search context; empty when the search failed.
    pub context: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub receipt: Option<PostReceipt>,
    /// Every stage failure in the order encountered, soft ones included.
    pub failures: Vec<StageError>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self {
            state: RunState::Idle,
            trends: Vec::new(),
            selection: None,
            context: String::new(),
            content: None,
            image_url: None,
            receipt: None,
            failures: Vec::new(),
        }
    }
}

impl PipelineRun {
    /// The trend the run wrote about.
    #[must_use]
    pub fn selected_trend(&self) -> Option<&TrendItem> {
        self.selection.as_ref().and_then(Selection::trend)
    }

    /// The failure that halted the run, if it was halted.
    #[must_use]
    pub fn halted_by(&self) -> Option<&StageError> {
        if matches!(self.state, RunState::FetchFailed | RunState::PostFailed) {
            self.failures.last()
        } else {
            None
        }
    }

    /// First recorded failure for a stage.
    #[must_use]
    pub fn failure(&self, stage: Stage) -> Option<&StageError> {
        self.failures.iter().find(|f| f.stage() == stage)
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid run transition {} -> {next}",
            self.state
        );
        tracing::debug!(from = %self.state, to = %next, "Run state changed");
        self.state = next;
    }

    /// Record a failure the run continues past.
    fn record(&mut self, error: StageError) {
        tracing::warn!(stage = %error.stage(), kind = error.kind(), error = %error.message(), "Stage degraded");
        self.failures.push(error);
    }

    /// Record a failure and move to the matching terminal state.
    fn halt(&mut self, error: StageError) {
        tracing::error!(stage = %error.stage(), kind = error.kind(), error = %error.message(), "Run halted");
        let terminal = if error.stage() == Stage::Publish {
            RunState::PostFailed
        } else {
            RunState::FetchFailed
        };
        self.failures.push(error);
        self.advance(terminal);
    }
}

/// Publishing switches for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Submit the post at the end of the run.
    pub publish: bool,
    /// Submit even when image generation failed.
    pub publish_without_image: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            publish: true,
            publish_without_image: false,
        }
    }
}

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub token: TokenProfile,
    pub image_description: String,
    /// Content prompt template.
    pub prompt: String,
    pub credentials: Credentials,
    pub options: RunOptions,
}

/// Sequential pipeline over the six stages.
pub struct Pipeline {
    source: TrendSource,
    retriever: ContextRetriever,
    selector: TrendSelector,
    generator: ContentGenerator,
    images: ImageGenerator,
    publisher: Publisher,
}

impl Pipeline {
    /// Build every stage from settings, using SiliconFlow for text and images.
    pub fn new(settings: &Settings) -> Result<Self> {
        let provider = Arc::new(
            SiliconFlowProvider::new(settings.siliconflow_api_key.clone())?
                .with_base_url(settings.model_api_base.clone()),
        );

        if !AIProvider::is_configured(provider.as_ref()) {
            tracing::warn!("SILICONFLOW_API_KEY not set - model calls will fail");
        }

        Self::with_providers(settings, provider.clone(), provider)
    }

    /// Build every stage from settings with the given model providers.
    pub fn with_providers(
        settings: &Settings,
        text: Arc<dyn AIProvider>,
        images: Arc<dyn ImageProvider>,
    ) -> Result<Self> {
        let search = SerperClient::new(
            settings.serper_api_key.clone(),
            settings.search_url.clone(),
        )?;
        if !search.is_configured() {
            tracing::warn!("SERPER_API_KEY not set - runs will have no search context");
        }

        Ok(Self {
            source: TrendSource::new(settings.trends_url.clone())?,
            retriever: ContextRetriever::new(search),
            selector: TrendSelector::new(text.clone(), settings.text_model.clone())?,
            generator: ContentGenerator::new(text, settings.text_model.clone())?,
            images: ImageGenerator::new(images, settings.image_model.clone()),
            publisher: Publisher::new(settings.twitter_api_base.clone()),
        })
    }

    /// Run every stage once, in order.
    ///
    /// Never fails as a whole; stage failures are recorded on the returned run.
    pub async fn run(&self, request: &RunRequest) -> PipelineRun {
        let mut run = PipelineRun::default();

        if !request.token.is_complete() {
            let missing = request.token.missing_fields().join(", ");
            run.halt(StageError::MissingTokenInfo(format!("blank {missing}")));
            return run;
        }

        tracing::info!(token = %request.token.name, "Starting pipeline run");

        match self.source.fetch().await {
            Ok(trends) if trends.is_empty() => {
                run.halt(StageError::FetchFailed("no trends found on page".to_string()));
                return run;
            }
            Ok(trends) => {
                run.trends = trends;
                run.advance(RunState::TrendsFetched);
            }
            Err(e) => {
                run.halt(e);
                return run;
            }
        }

        let selection = self.selector.select(&run.trends, &request.token).await;
        let trend = match &selection {
            Selection::Selected { trend, .. } => trend.clone(),
            Selection::Fallback { trend, reason } => {
                run.record(StageError::SelectionFailed(reason.clone()));
                trend.clone()
            }
            Selection::Rejected { reason } => {
                run.failures.push(StageError::SelectionFailed(reason.clone()));
                run.halt(StageError::FetchFailed("no trend could be selected".to_string()));
                return run;
            }
        };
        tracing::info!(trend = %trend, fallback = selection.is_fallback(), "Selected trend");
        run.selection = Some(selection);
        run.advance(RunState::TrendSelected);

        match self.retriever.retrieve(&[trend.as_str()]).await {
            Ok(context) => run.context = context,
            Err(e) => run.record(e),
        }

        let content = match self
            .generator
            .generate(&request.prompt, &request.token, &trend, &run.context)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                run.halt(e);
                return run;
            }
        };
        run.content = Some(content.clone());
        run.advance(RunState::ContentGenerated);

        match self.images.generate(&request.image_description, &content).await {
            Ok(url) => {
                run.image_url = Some(url);
                run.advance(RunState::ImageGenerated);
            }
            Err(e) => run.record(e),
        }

        if !request.options.publish {
            tracing::info!(state = %run.state, "Publishing disabled, stopping");
            return run;
        }
        if run.image_url.is_none() && !request.options.publish_without_image {
            tracing::info!("No image generated, skipping publish");
            return run;
        }

        let client = match self.publisher.authenticate(&request.credentials) {
            Ok(client) => client,
            Err(e) => {
                run.halt(e);
                return run;
            }
        };
        run.advance(RunState::Authenticated);

        match self.publisher.post(&client, &content).await {
            Ok(receipt) => {
                run.receipt = Some(receipt);
                run.advance(RunState::Posted);
            }
            Err(e) => run.halt(e),
        }

        tracing::info!(state = %run.state, failures = run.failures.len(), "Pipeline run finished");
        run
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            RunState::Idle,
            RunState::TrendsFetched,
            RunState::TrendSelected,
            RunState::ContentGenerated,
            RunState::ImageGenerated,
            RunState::Authenticated,
            RunState::Posted,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_no_skipping_or_reentry() {
        assert!(!RunState::Idle.can_transition_to(RunState::TrendSelected));
        assert!(!RunState::Posted.can_transition_to(RunState::Idle));
        assert!(!RunState::FetchFailed.can_transition_to(RunState::TrendsFetched));
        assert!(!RunState::TrendsFetched.can_transition_to(RunState::PostFailed));
        assert!(!RunState::ImageGenerated.can_transition_to(RunState::FetchFailed));
    }

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Posted.is_terminal());
        assert!(RunState::FetchFailed.is_terminal());
        assert!(RunState::PostFailed.is_terminal());
        assert!(!RunState::ImageGenerated.is_terminal());
    }

    #[test]
    fn test_halt_maps_stage_to_terminal_state() {
        let mut run = PipelineRun::default();
        run.halt(StageError::FetchFailed("timeout".to_string()));
        assert_eq!(run.state, RunState::FetchFailed);
        assert_eq!(run.halted_by().map(StageError::kind), Some("FetchFailed"));

        let mut run = PipelineRun {
            state: RunState::Authenticated,
            ..PipelineRun::default()
        };
        run.halt(StageError::PostFailed("duplicate content".to_string()));
        assert_eq!(run.state, RunState::PostFailed);
        assert!(run.halted_by().unwrap().is_retryable());
    }

    #[test]
    fn test_soft_failures_do_not_halt() {
        let mut run = PipelineRun {
            state: RunState::ContentGenerated,
            ..PipelineRun::default()
        };
        run.record(StageError::ImageFailed("nsfw filter".to_string()));
        assert_eq!(run.state, RunState::ContentGenerated);
        assert!(run.halted_by().is_none());
        assert!(run.failure(Stage::Image).is_some());
        assert!(run.failure(Stage::Context).is_none());
    }

    #[test]
    fn test_missing_token_info_halts_from_idle() {
        let mut run = PipelineRun::default();
        run.halt(StageError::MissingTokenInfo("token name is blank".to_string()));
        assert_eq!(run.state, RunState::FetchFailed);
        assert_eq!(run.halted_by().unwrap().stage(), Stage::Input);
    }

    #[test]
    fn test_default_options_gate_on_image() {
        let options = RunOptions::default();
        assert!(options.publish);
        assert!(!options.publish_without_image);
    }
}
