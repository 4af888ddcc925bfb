// src/output/render.rs
//! Turns pipeline results and health probes into text or JSON.

use crate::config::OutputFormat;
use crate::error::AppError;
use crate::inference::{BackendHealth, BackendSettings};
use crate::pipeline::{PipelineOutcome, PipelineResult, Stage};
use crate::synthesis_output::{DeviceConfigBlock, SynthesisOutcome};
use crate::types::Category;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write;
use uuid::Uuid;

/// JSON shape of one run, a superset of the original API response body.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub run_id: Uuid,
    pub prompt_version: String,
    pub success: bool,
    pub classification_type: Option<Category>,
    pub steps: Vec<String>,
    pub cisco_config: Option<String>,
    pub outcome: &'static str,
    pub devices: Vec<DeviceConfigBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_data: Option<String>,
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    pub elapsed_ms: u64,
    pub generated_at: DateTime<Utc>,
}

impl From<&PipelineResult> for ConfigResponse {
    fn from(result: &PipelineResult) -> Self {
        let synthesis = result.synthesis();
        Self {
            run_id: result.run_id,
            prompt_version: result.prompt_version.clone(),
            success: result.success(),
            classification_type: result.classification.as_ref().map(|c| c.category),
            steps: result
                .classification
                .as_ref()
                .map(|c| c.steps.clone())
                .unwrap_or_default(),
            cisco_config: result.raw_config_text.clone(),
            outcome: result.outcome.label(),
            devices: synthesis.map(|s| s.blocks().to_vec()).unwrap_or_default(),
            missing_data: match synthesis {
                Some(SynthesisOutcome::Insufficient { reason }) => Some(reason.clone()),
                _ => None,
            },
            error_message: result.error_message(),
            failed_stage: match &result.outcome {
                PipelineOutcome::Failed { stage, .. } => Some(*stage),
                _ => None,
            },
            elapsed_ms: result.elapsed.as_millis() as u64,
            generated_at: Utc::now(),
        }
    }
}

pub fn render_result(result: &PipelineResult, format: OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&ConfigResponse::from(result))?),
        OutputFormat::Text => render_text(result),
    }
}

/// Renders results in the order given; JSON output is always an array.
pub fn render_batch(results: &[PipelineResult], format: OutputFormat) -> Result<String, AppError> {
    match format {
        OutputFormat::Json => {
            let responses: Vec<ConfigResponse> = results.iter().map(ConfigResponse::from).collect();
            Ok(serde_json::to_string_pretty(&responses)?)
        }
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, result) in results.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                writeln!(out, "=== Request {}/{} ===", i + 1, results.len())?;
                out.push_str(&render_text(result)?);
            }
            let failed = results.iter().filter(|r| !r.success()).count();
            writeln!(
                out,
                "\n{} run(s): {} succeeded, {} failed",
                results.len(),
                results.len() - failed,
                failed
            )?;
            Ok(out)
        }
    }
}

fn render_text(result: &PipelineResult) -> Result<String, AppError> {
    let mut out = String::new();
    writeln!(out, "Run:            {} (prompts {})", result.run_id, result.prompt_version)?;

    if let Some(classification) = &result.classification {
        writeln!(
            out,
            "Classification: {} ({})",
            classification.category,
            classification.category.description()
        )?;
        writeln!(out, "Steps:")?;
        for (i, step) in classification.steps.iter().enumerate() {
            writeln!(out, "  {}. {}", i + 1, step)?;
        }
    }

    match &result.outcome {
        PipelineOutcome::Synthesized(SynthesisOutcome::Blocks { blocks }) => {
            writeln!(
                out,
                "Outcome:        configuration, {} command(s) for {} device(s)",
                result.synthesis().map(|s| s.command_count()).unwrap_or(0),
                blocks.len()
            )?;
            for block in blocks {
                writeln!(out, "\n~~~{}~~~", block.device_name)?;
                for command in &block.commands {
                    writeln!(out, "{}", command)?;
                }
            }
        }
        PipelineOutcome::Synthesized(SynthesisOutcome::Insufficient { reason }) => {
            writeln!(out, "Outcome:        insufficient data")?;
            writeln!(out, "Missing:        {}", reason)?;
        }
        PipelineOutcome::Synthesized(SynthesisOutcome::NotApplicable) => {
            writeln!(out, "Outcome:        no configuration required")?;
        }
        PipelineOutcome::Synthesized(SynthesisOutcome::Unrecognized) => {
            writeln!(out, "Outcome:        unrecognized reply format")?;
            if let Some(raw) = &result.raw_config_text {
                writeln!(out, "\n{}", raw.trim_end())?;
            }
        }
        PipelineOutcome::NothingToSynthesize => {
            writeln!(out, "Outcome:        nothing to synthesize (no steps)")?;
        }
        PipelineOutcome::Failed { stage, failure } => {
            writeln!(
                out,
                "Outcome:        failed while {}",
                stage.to_string().to_lowercase()
            )?;
            writeln!(out, "Error:          {}", failure.describe())?;
        }
    }

    Ok(out)
}

pub fn render_health(
    health: &BackendHealth,
    settings: &BackendSettings,
    format: OutputFormat,
) -> Result<String, AppError> {
    if format == OutputFormat::Json {
        return Ok(serde_json::to_string_pretty(&serde_json::json!({
            "endpoint": settings.base_url,
            "model": settings.model.as_str(),
            "health": health,
        }))?);
    }

    let mut out = String::new();
    writeln!(out, "Endpoint: {}", settings.base_url)?;
    writeln!(out, "Model:    {}", settings.model)?;
    match health {
        BackendHealth::Healthy {
            model_available: true,
            ..
        } => writeln!(out, "Status:   healthy, model available")?,
        BackendHealth::Healthy { models, .. } => writeln!(
            out,
            "Status:   healthy, but the model is not installed (installed: {})",
            if models.is_empty() {
                "none".to_string()
            } else {
                models.join(", ")
            }
        )?,
        BackendHealth::Degraded { status } => {
            writeln!(out, "Status:   degraded (HTTP {})", status)?
        }
        BackendHealth::Unreachable { reason } => writeln!(out, "Status:   unreachable: {}", reason)?,
    }
    Ok(out)
}
