// src/pipeline.rs
//! The orchestrator: classify, then synthesize, then read the outcome.
//!
//! A run is a straight line with two exits:
//!
//! ```text
//! START → CLASSIFYING ──ok──→ SYNTHESIZING ──ok──→ DONE
//!              │                    │
//!              └──────failure───────┴──→ FAILED
//! ```
//!
//! Every run builds its own [`PipelineResult`]; nothing survives between
//! runs except the shared, bounded inference backend.

use crate::classifier::{Classifier, PhaseSettings};
use crate::error::PipelineFailure;
use crate::error_recovery::{retry_with_backoff, RetryPolicy};
use crate::inference::InferenceBackend;
use crate::prompts::PromptTemplates;
use crate::synthesis_output::{parse_synthesis_output, SynthesisOutcome};
use crate::synthesizer::ConfigSynthesizer;
use crate::types::{Classification, Requirement, TopologyInfo};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One unit of work, shaped like the original API request body.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PipelineRequest {
    pub requirement: String,
    #[serde(default)]
    pub network_state: Option<String>,
}

/// Where a run was when it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Classifying,
    Synthesizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validating => write!(f, "VALIDATING"),
            Self::Classifying => write!(f, "CLASSIFYING"),
            Self::Synthesizing => write!(f, "SYNTHESIZING"),
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Both phases ran; the reply was read into a tagged outcome.
    Synthesized(SynthesisOutcome),
    /// Classification succeeded with no steps, so synthesis was skipped.
    NothingToSynthesize,
    /// The run stopped at `stage`.
    Failed {
        stage: Stage,
        failure: PipelineFailure,
    },
}

impl PipelineOutcome {
    /// Stable name used in rendered output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Synthesized(outcome) => outcome.label(),
            Self::NothingToSynthesize => "nothing_to_synthesize",
            Self::Failed { .. } => "failed",
        }
    }
}

/// The unit returned to callers; one per run, never reused.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub prompt_version: String,
    pub classification: Option<Classification>,
    pub raw_config_text: Option<String>,
    pub outcome: PipelineOutcome,
    pub elapsed: Duration,
}

impl PipelineResult {
    /// `false` only when the pipeline broke. A model declining to guess is a success.
    pub fn success(&self) -> bool {
        !matches!(self.outcome, PipelineOutcome::Failed { .. })
    }

    pub fn error_message(&self) -> Option<String> {
        match &self.outcome {
            PipelineOutcome::Failed { failure, .. } => Some(failure.describe()),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PipelineFailure> {
        match &self.outcome {
            PipelineOutcome::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn synthesis(&self) -> Option<&SynthesisOutcome> {
        match &self.outcome {
            PipelineOutcome::Synthesized(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Knobs for both phases plus the classification re-prompt policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineSettings {
    pub classification: PhaseSettings,
    pub synthesis: PhaseSettings,
    pub reprompt: RetryPolicy,
}

/// Sequences the classifier and the synthesizer.
pub struct Pipeline {
    classifier: Classifier,
    synthesizer: ConfigSynthesizer,
    reprompt: RetryPolicy,
    prompt_version: String,
}

impl Pipeline {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        templates: Arc<PromptTemplates>,
        settings: PipelineSettings,
    ) -> Self {
        log::debug!("Pipeline using {}", backend.describe());
        Self {
            classifier: Classifier::new(
                backend.clone(),
                templates.clone(),
                settings.classification,
            ),
            synthesizer: ConfigSynthesizer::new(backend, templates.clone(), settings.synthesis),
            reprompt: settings.reprompt,
            prompt_version: templates.version().to_string(),
        }
    }

    /// Runs one requirement through both phases. Failures are reported inside
    /// the result, never as an `Err`.
    pub async fn run(&self, requirement: &str, topology: Option<&str>) -> PipelineResult {
        let run = RunContext::start(&self.prompt_version);

        let requirement = match Requirement::new(requirement) {
            Ok(requirement) => requirement,
            Err(e) => return run.failed(Stage::Validating, e.into()),
        };
        let topology = TopologyInfo::from_optional(topology);

        log::info!("[{}] {}", run.id, Stage::Classifying);
        let classification = match self.classify(&requirement).await {
            Ok(classification) => classification,
            Err(failure) => return run.failed(Stage::Classifying, failure),
        };

        if !classification.has_steps() {
            log::warn!("[{}] Classification produced no steps; nothing to synthesize", run.id);
            return run.finish(Some(classification), None, PipelineOutcome::NothingToSynthesize);
        }

        log::info!("[{}] {}", run.id, Stage::Synthesizing);
        let raw = match self
            .synthesizer
            .synthesize(&requirement, &classification.steps, topology.as_ref())
            .await
        {
            Ok(raw) => raw,
            Err(failure) => return run.failed(Stage::Synthesizing, failure),
        };

        let outcome = parse_synthesis_output(&raw);
        match &outcome {
            SynthesisOutcome::Insufficient { reason } => {
                log::info!("[{}] Model asked for more data: {}", run.id, reason)
            }
            SynthesisOutcome::NotApplicable => {
                log::info!("[{}] Model found no configuration to generate", run.id)
            }
            SynthesisOutcome::Blocks { blocks } => log::info!(
                "[{}] Generated {} command(s) for {} device(s)",
                run.id,
                outcome.command_count(),
                blocks.len()
            ),
            SynthesisOutcome::Unrecognized => log::warn!(
                "[{}] Reply follows neither the separator nor the sentinel format; kept verbatim",
                run.id
            ),
        }

        run.finish(
            Some(classification),
            Some(raw),
            PipelineOutcome::Synthesized(outcome),
        )
    }

    /// Runs independent requests with at most `concurrency` in flight,
    /// returning results in input order.
    pub async fn run_batch(
        &self,
        requests: Vec<PipelineRequest>,
        concurrency: usize,
    ) -> Vec<PipelineResult> {
        log::info!(
            "Running {} request(s), {} at a time",
            requests.len(),
            concurrency.max(1)
        );
        stream::iter(requests)
            .map(|request| async move {
                self.run(&request.requirement, request.network_state.as_deref())
                    .await
            })
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    async fn classify(&self, requirement: &Requirement) -> Result<Classification, PipelineFailure> {
        retry_with_backoff(
            move |attempt| {
                if attempt > 1 {
                    log::info!("Re-prompting classification (attempt {})", attempt);
                }
                self.classifier.classify(requirement)
            },
            self.reprompt,
            RetryPolicy::reprompt_classification,
        )
        .await
    }
}

/// Per-run bookkeeping: identity and timing.
struct RunContext<'a> {
    id: Uuid,
    started: Instant,
    prompt_version: &'a str,
}

impl<'a> RunContext<'a> {
    fn start(prompt_version: &'a str) -> Self {
        Self {
            id: Uuid::new_v4(),
            started: Instant::now(),
            prompt_version,
        }
    }

    fn finish(
        self,
        classification: Option<Classification>,
        raw_config_text: Option<String>,
        outcome: PipelineOutcome,
    ) -> PipelineResult {
        let elapsed = self.started.elapsed();
        log::info!("[{}] DONE in {:.1}s", self.id, elapsed.as_secs_f32());
        PipelineResult {
            run_id: self.id,
            prompt_version: self.prompt_version.to_string(),
            classification,
            raw_config_text,
            outcome,
            elapsed,
        }
    }

    /// A failed run carries no data from earlier stages.
    fn failed(self, stage: Stage, failure: PipelineFailure) -> PipelineResult {
        log::error!("[{}] FAILED while {}: {}", self.id, stage, failure.describe());
        self.finish(None, None, PipelineOutcome::Failed { stage, failure })
    }
}
