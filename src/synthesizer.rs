// src/synthesizer.rs
//! Phase 2: requirement + steps (+ topology) → raw per-device command text.
//!
//! The synthesizer enforces the output contract through the prompt only. It
//! hands back exactly what the model wrote; reading that text is
//! [`crate::synthesis_output`]'s job.

use crate::classifier::PhaseSettings;
use crate::error::PipelineFailure;
use crate::inference::{complete_within, CompletionRequest, InferenceBackend};
use crate::prompts::PromptTemplates;
use crate::types::{Requirement, TopologyInfo};
use std::sync::Arc;

/// Asks the model for Cisco IOS commands implementing the classified steps.
pub struct ConfigSynthesizer {
    backend: Arc<dyn InferenceBackend>,
    templates: Arc<PromptTemplates>,
    settings: PhaseSettings,
}

impl ConfigSynthesizer {
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

    pub async fn synthesize(
        &self,
        requirement: &Requirement,
        steps: &[String],
        topology: Option<&TopologyInfo>,
    ) -> Result<String, PipelineFailure> {
        let prompt = self
            .templates
            .synthesis_prompt(requirement, steps, topology)
            .map_err(|e| PipelineFailure::PromptTemplate {
                reason: e.to_string(),
            })?;
        log::debug!("Synthesis prompt:\n{}", prompt);

        if topology.is_none() {
            log::info!("No topology supplied; the model must refuse rather than invent values");
        }

        let request = CompletionRequest::new(prompt, self.settings.temperature, self.settings.timeout);
        let raw = complete_within(self.backend.as_ref(), &request).await?;
        log::debug!("Synthesis reply:\n{}", raw);

        if raw.trim().is_empty() {
            log::error!("Model returned an empty synthesis reply");
            return Err(PipelineFailure::EmptySynthesis);
        }

        Ok(raw)
    }
}
