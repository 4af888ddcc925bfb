// src/inference/client.rs
//! Thin HTTP client for a local Ollama server.
//!
//! This module owns the transport: building requests, applying the
//! timeout, and translating reqwest failures into [`InferenceError`].
//! It does not know what the prompts mean.

use super::responses::{
    GenerateOptions, GenerateRequest, GenerateResponse, OllamaErrorBody, TagsResponse,
};
use super::{CompletionRequest, InferenceBackend};
use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, HEALTH_PROBE_TIMEOUT};
use crate::error::{AppError, InferenceError};
use crate::types::{ModelId, ValidatedUrl};
use reqwest::{header, Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

const GENERATE_PATH: &str = "api/generate";
const TAGS_PATH: &str = "api/tags";

/// Where the model server lives and which model it should run.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub base_url: ValidatedUrl,
    pub model: ModelId,
}

/// Result of probing the model server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BackendHealth {
    /// Server answered; lists the installed models.
    Healthy {
        models: Vec<String>,
        model_available: bool,
    },
    /// Server answered with an error status.
    Degraded { status: u16 },
    /// Server could not be reached.
    Unreachable { reason: String },
}

impl BackendHealth {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy { .. })
    }
}

/// A thin wrapper around reqwest Client for Ollama requests.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    settings: BackendSettings,
}

impl OllamaClient {
    pub fn new(settings: BackendSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers())
            .build()?;
        Ok(Self { client, settings })
    }

    fn create_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    pub fn settings(&self) -> &BackendSettings {
        &self.settings
    }

    /// Checks that the server is up and whether the configured model is installed.
    pub async fn probe(&self) -> BackendHealth {
        let url = self.settings.base_url.endpoint(TAGS_PATH);
        log::debug!("GET {}", url);

        let response = match self
            .client
            .get(&url)
            .timeout(HEALTH_PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Health probe failed: {}", e);
                return BackendHealth::Unreachable {
                    reason: e.to_string(),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            return BackendHealth::Degraded {
                status: status.as_u16(),
            };
        }

        match response.json::<TagsResponse>().await {
            Ok(tags) => {
                let models: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
                let model_available = models
                    .iter()
                    .any(|name| model_matches(name, self.settings.model.as_str()));
                BackendHealth::Healthy {
                    models,
                    model_available,
                }
            }
            Err(e) => {
                log::warn!("Health probe returned an unreadable model list: {}", e);
                BackendHealth::Degraded {
                    status: status.as_u16(),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl InferenceBackend for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, InferenceError> {
        let url = self.settings.base_url.endpoint(GENERATE_PATH);
        let body = GenerateRequest {
            model: self.settings.model.as_str(),
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
            },
        };

        log::debug!(
            "POST {} (model {}, temperature {}, {} prompt bytes)",
            url,
            self.settings.model,
            request.temperature,
            request.prompt.len()
        );

        let response = self
            .client
            .post(&url)
            .timeout(request.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, request.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport_error(e, request.timeout))?;

        if !status.is_success() {
            return Err(rejection(status, &text));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| InferenceError::Rejected {
                status: status.as_u16(),
                message: format!(
                    "unreadable generate response ({}): {}",
                    e,
                    preview(&text)
                ),
            })?;

        if !parsed.done {
            log::debug!("Generate response arrived without done=true");
        }
        if let Some(nanos) = parsed.total_duration {
            log::debug!(
                "Generation took {:?}",
                Duration::from_nanos(nanos)
            );
        }

        Ok(parsed.response)
    }

    fn describe(&self) -> String {
        format!(
            "Ollama at {} (model {})",
            self.settings.base_url, self.settings.model
        )
    }
}

/// Classifies a reqwest failure; a timeout is never reported as unreachable.
fn transport_error(err: reqwest::Error, timeout: Duration) -> InferenceError {
    if err.is_timeout() {
        InferenceError::Timeout { after: timeout }
    } else {
        InferenceError::Unreachable {
            reason: err.to_string(),
        }
    }
}

fn rejection(status: StatusCode, body: &str) -> InferenceError {
    let message = serde_json::from_str::<OllamaErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| preview(body));
    log::error!("Ollama answered {}: {}", status, message);
    InferenceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

/// Ollama reports `llama3.1:latest` for a model pulled as `llama3.1`.
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || (!wanted.contains(':') && installed.strip_suffix(":latest") == Some(wanted))
}

pub(crate) fn preview(text: &str) -> String {
    if text.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = text.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
