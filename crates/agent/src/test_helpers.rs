//! Shared test helpers for agent tests.

use std::sync::Mutex;

use codewright_core::error::ProviderError;
use codewright_core::provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, Usage};

/// A mock provider that returns scripted replies in sequence and records
/// every request it receives.
///
/// With `repeat_last`, the final reply is returned forever instead of
/// panicking once the script runs out.
pub struct ScriptedProvider {
    replies: Vec<Result<String, ProviderError>>,
    repeat_last: bool,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Self {
        Self::with_results(replies.into_iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn with_results(replies: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            replies,
            repeat_last: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `reply`.
    pub fn repeating(reply: &str) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(vec![reply])
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next_reply(&self, request: ProviderRequest) -> Result<String, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len();
        requests.push(request);

        let index = if self.repeat_last {
            index.min(self.replies.len() - 1)
        } else {
            index
        };
        match self.replies.get(index) {
            Some(reply) => reply.clone(),
            None => panic!(
                "ScriptedProvider exhausted: call #{}, have {}",
                index + 1,
                self.replies.len()
            ),
        }
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let content = self.next_reply(request)?;
        Ok(ProviderResponse {
            content,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }

    /// Streams the scripted reply a few characters at a time.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<StreamChunk, ProviderError>>, ProviderError> {
        let content = self.next_reply(request)?;
        let chars: Vec<char> = content.chars().collect();
        let (tx, rx) = tokio::sync::mpsc::channel(chars.len() / 4 + 2);
        for piece in chars.chunks(4) {
            let _ = tx
                .send(Ok(StreamChunk {
                    content: Some(piece.iter().collect()),
                    done: false,
                    usage: None,
                }))
                .await;
        }
        let _ = tx
            .send(Ok(StreamChunk {
                content: None,
                done: true,
                usage: None,
            }))
            .await;
        Ok(rx)
    }
}
