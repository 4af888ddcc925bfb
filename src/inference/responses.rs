// src/inference/responses.rs
//! Wire types for the Ollama HTTP API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate` with streaming disabled.
#[derive(Debug, Serialize)]
pub(super) struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: GenerateOptions,
}

#[derive(Debug, Serialize)]
pub(super) struct GenerateOptions {
    pub temperature: f32,
}

/// Non-streaming answer of `POST /api/generate`.
///
/// Only `response` matters to the pipeline; a missing field reads as empty
/// text, which the stages then judge on their own terms.
#[derive(Debug, Deserialize)]
pub(super) struct GenerateResponse {
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub total_duration: Option<u64>,
}

/// Error body Ollama sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(super) struct OllamaErrorBody {
    pub error: String,
}

/// Answer of `GET /api/tags`.
#[derive(Debug, Deserialize)]
pub(super) struct TagsResponse {
    #[serde(default)]
    pub models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ModelTag {
    pub name: String,
}
