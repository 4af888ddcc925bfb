// src/classifier.rs
//! Phase 1: requirement → category and ordered implementation steps.

use crate::error::PipelineFailure;
use crate::inference::{complete_within, CompletionRequest, InferenceBackend};
use crate::prompts::PromptTemplates;
use crate::types::{Category, Classification, Requirement};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Sampling temperature and time budget for one prompting phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseSettings {
    pub temperature: f32,
    pub timeout: Duration,
}

/// Asks the model to classify a requirement and break it into steps.
pub struct Classifier {
    backend: Arc<dyn InferenceBackend>,
    templates: Arc<PromptTemplates>,
    settings: PhaseSettings,
}

impl Classifier {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        templates: Arc<PromptTemplates>,
        settings: PhaseSettings,
    ) -> Self {
        Self {
            backend,
            templates,
            settings,
        }
    }

    pub async fn classify(&self, requirement: &Requirement) -> Result<Classification, PipelineFailure> {
        let prompt = self
            .templates
            .classification_prompt(requirement)
            .map_err(|e| PipelineFailure::PromptTemplate {
                reason: e.to_string(),
            })?;
        log::debug!("Classification prompt:\n{}", prompt);

        let request = CompletionRequest::new(prompt, self.settings.temperature, self.settings.timeout);
        let raw = complete_within(self.backend.as_ref(), &request).await?;
        log::debug!("Classification reply:\n{}", raw);

        let classification = parse_classification(&raw)?;
        log::info!(
            "Classified as {} ({}) with {} step(s)",
            classification.category,
            classification.category.description(),
            classification.steps.len()
        );
        Ok(classification)
    }
}

/// Reads the model's reply strictly as the `{"type", "steps"}` JSON object.
///
/// Extra keys are ignored; nothing is repaired. Markdown fences, prose around
/// the object, unknown categories and non-string steps are all rejected.
pub fn parse_classification(raw: &str) -> Result<Classification, PipelineFailure> {
    let malformed = |reason: String| PipelineFailure::MalformedClassification { reason };

    let value: Value = serde_json::from_str(raw).map_err(|e| {
        malformed(format!(
            "reply is not JSON ({}): {}",
            e,
            crate::inference::client::preview(raw.trim())
        ))
    })?;

    let object = value
        .as_object()
        .ok_or_else(|| malformed("reply is JSON but not an object".to_string()))?;

    let category = object
        .get("type")
        .ok_or_else(|| malformed("missing key `type`".to_string()))?
        .as_str()
        .ok_or_else(|| malformed("`type` is not a string".to_string()))?
        .parse::<Category>()
        .map_err(|e| malformed(e.to_string()))?;

    let steps = object
        .get("steps")
        .ok_or_else(|| malformed("missing key `steps`".to_string()))?
        .as_array()
        .ok_or_else(|| malformed("`steps` is not an array".to_string()))?
        .iter()
        .enumerate()
        .map(|(i, step)| {
            step.as_str()
                .map(str::to_string)
                .ok_or_else(|| malformed(format!("step {} is not a string", i + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Classification::new(category, steps))
}
