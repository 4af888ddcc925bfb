// src/inference/mod.rs
//! Inference capability: the ability to turn a prompt into model text.
//!
//! Business logic depends on [`InferenceBackend`], never on HTTP details.
//! The Ollama transport in [`client`] is one implementation; [`testing`]
//! holds scripted in-memory ones.

pub mod client;
mod limiter;
mod responses;

use crate::error::InferenceError;
use std::time::Duration;

pub use client::{BackendHealth, BackendSettings, OllamaClient};
pub use limiter::BoundedBackend;

/// One generation request: the prompt plus its sampling and time budget.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32, timeout: Duration) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            timeout,
        }
    }
}

/// The ability to complete a prompt with a language model.
///
/// Implementations must be safe to call concurrently; callers that need to
/// protect a single model server wrap the backend in a [`BoundedBackend`].
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError>;

    /// `complete` under the request's deadline. Wrappers that queue callers
    /// override this so the clock starts only once the call can proceed.
    async fn complete_timed(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        with_deadline(&self.describe(), request, self.complete(request)).await
    }

    /// Human-readable backend description for logs.
    fn describe(&self) -> String {
        "inference backend".to_string()
    }
}

/// Calls the backend and enforces the request timeout regardless of transport.
pub async fn complete_within(
    backend: &dyn InferenceBackend,
    request: &CompletionRequest,
) -> Result<String, InferenceError> {
    backend.complete_timed(request).await
}

async fn with_deadline<F>(
    describe: &str,
    request: &CompletionRequest,
    call: F,
) -> Result<String, InferenceError>
where
    F: std::future::Future<Output = Result<String, InferenceError>>,
{
    match tokio::time::timeout(request.timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} did not answer within {:?}", describe, request.timeout);
            Err(InferenceError::Timeout {
                after: request.timeout,
            })
        }
    }
}

pub mod testing {
    //! In-memory backends for exercising the pipeline without a model server.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard};

    /// Replays canned responses in order and records every request it sees.
    /// Once the script runs out, calls fail as unreachable.
    pub struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String, InferenceError>>>,
        seen: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: Vec<Result<String, InferenceError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(texts: &[&str]) -> Self {
            Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
        }

        pub fn calls(&self) -> usize {
            self.seen().len()
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.seen().clone()
        }

        pub fn prompts(&self) -> Vec<String> {
            self.seen().iter().map(|r| r.prompt.clone()).collect()
        }

        fn seen(&self) -> MutexGuard<'_, Vec<CompletionRequest>> {
            self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    #[async_trait::async_trait]
    impl InferenceBackend for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
            self.seen().push(request.clone());
            self.replies
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front()
                .unwrap_or_else(|| {
                    Err(InferenceError::Unreachable {
                        reason: "script exhausted".to_string(),
                    })
                })
        }

        fn describe(&self) -> String {
            "scripted backend".to_string()
        }
    }

    /// Never answers; used to exercise timeout handling.
    pub struct SilentBackend;

    #[async_trait::async_trait]
    impl InferenceBackend for SilentBackend {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, InferenceError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(String::new())
        }
    }
}
