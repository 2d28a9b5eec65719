//! Scripted provider used by unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions};
use crate::error::{ClientError, ClientResult};

/// Replays canned replies in order and records every request.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<(Vec<AIMessage>, GenerateOptions)>>,
}

impl ScriptedProvider {
    pub(crate) fn replying(replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            calls: Mutex::default(),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Vec<AIMessage>, GenerateOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AIProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> ClientResult<AIResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), options.clone()));

        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(AIResponse {
                text,
                model: model.to_string(),
            }),
            Some(Err(message)) => Err(ClientError::Api {
                status: 500,
                message,
            }),
            None => Err(ClientError::Parse("no scripted reply left".to_string())),
        }
    }
}
