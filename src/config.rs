// src/config.rs
use crate::classifier::PhaseSettings;
use crate::constants::*;
use crate::error::AppError;
use crate::error_recovery::RetryPolicy;
use crate::inference::BackendSettings;
use crate::pipeline::{PipelineRequest, PipelineSettings};
use crate::types::{ModelId, ValidatedUrl, ValidationError};
use clap::{Parser, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Network requirement in natural language (e.g., "Configure OSPF area 0 on Router1")
    pub requirement: Option<String>,

    /// Known device names, interfaces, addresses and protocol parameters
    #[arg(long, conflicts_with = "topology_file")]
    pub topology: Option<String>,

    /// Read the network state/topology from a file
    #[arg(long)]
    pub topology_file: Option<String>,

    /// JSON Lines file of {"requirement", "network_state"} objects to run as a batch
    #[arg(long, conflicts_with_all = ["requirement", "topology", "topology_file"])]
    pub requests_file: Option<String>,

    /// Probe the inference backend and exit
    #[arg(long, default_value_t = false)]
    pub check: bool,

    /// Ollama base URL (falls back to $OLLAMA_URL, then http://localhost:11434)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Model identifier (falls back to $OLLAMA_MODEL)
    #[arg(long)]
    pub model: Option<String>,

    /// Per-call inference timeout in seconds
    #[arg(long, default_value_t = DEFAULT_INFERENCE_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Sampling temperature for classification
    #[arg(long, default_value_t = CLASSIFICATION_TEMPERATURE)]
    pub classify_temperature: f32,

    /// Sampling temperature for configuration synthesis
    #[arg(long, default_value_t = SYNTHESIS_TEMPERATURE)]
    pub synthesis_temperature: f32,

    /// Classification attempts when the model's reply is malformed (1 = fail fast)
    #[arg(long, default_value_t = DEFAULT_CLASSIFY_ATTEMPTS)]
    pub classify_attempts: u32,

    /// Concurrent generations allowed against the model server (max 32)
    #[arg(long, default_value_t = DEFAULT_BACKEND_CONCURRENCY)]
    pub concurrency: usize,

    /// Directory containing classify.hbs and synthesize.hbs overrides
    #[arg(long)]
    pub template_dir: Option<String>,

    /// How results are rendered
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Output file for the rendered result (optional)
    #[arg(short, long)]
    pub output_file: Option<String>,

    /// Pipe mode - print only the rendered result to stdout
    #[arg(short = 'p', long, default_value_t = false)]
    pub pipe: bool,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Workload {
    /// Probe backend health only.
    HealthCheck,
    /// One requirement with optional topology.
    Single(PipelineRequest),
    /// Requests loaded from a JSON Lines file.
    Batch(PathBuf),
}

/// Resolved configuration, validated and ready to build the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub workload: Workload,
    pub endpoint: ValidatedUrl,
    pub model: ModelId,
    pub timeout: Duration,
    pub classify_temperature: f32,
    pub synthesis_temperature: f32,
    pub classify_attempts: u32,
    pub concurrency: usize,
    pub template_dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub output_file: Option<PathBuf>,
    pub pipe: bool,
    pub verbose: bool,
}

impl PipelineConfig {
    /// Resolves a complete configuration from CLI input and the process environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        Self::resolve_with_env(cli, |key| std::env::var(key).ok())
    }

    /// Resolves configuration with an explicit environment lookup.
    pub fn resolve_with_env(
        cli: CommandLineInput,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let endpoint = cli
            .endpoint
            .or_else(|| env(OLLAMA_URL_ENV))
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
        let model = cli
            .model
            .or_else(|| env(OLLAMA_MODEL_ENV))
            .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string());

        let workload = if cli.check {
            Workload::HealthCheck
        } else if let Some(path) = cli.requests_file {
            Workload::Batch(PathBuf::from(path))
        } else {
            let requirement = cli.requirement.ok_or_else(|| {
                AppError::MissingConfiguration(
                    "provide a REQUIREMENT, --requests-file or --check".to_string(),
                )
            })?;
            let network_state = match cli.topology_file {
                Some(path) => Some(fs::read_to_string(&path)?),
                None => cli.topology,
            };
            Workload::Single(PipelineRequest {
                requirement,
                network_state,
            })
        };

        Ok(PipelineConfig {
            workload,
            endpoint: ValidatedUrl::parse(&endpoint)?,
            model: ModelId::new(model)?,
            timeout: Duration::from_secs(check_bounds("timeout_secs", cli.timeout_secs, 1, 3600)?),
            classify_temperature: check_temperature("classify_temperature", cli.classify_temperature)?,
            synthesis_temperature: check_temperature(
                "synthesis_temperature",
                cli.synthesis_temperature,
            )?,
            classify_attempts: check_bounds(
                "classify_attempts",
                cli.classify_attempts,
                1,
                MAX_CLASSIFY_ATTEMPTS,
            )?,
            concurrency: check_bounds("concurrency", cli.concurrency, 1, MAX_BACKEND_CONCURRENCY)?,
            template_dir: cli.template_dir.map(PathBuf::from),
            format: cli.format,
            output_file: cli.output_file.map(PathBuf::from),
            pipe: cli.pipe,
            verbose: cli.verbose,
        })
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            base_url: self.endpoint.clone(),
            model: self.model.clone(),
        }
    }

    pub fn classification_settings(&self) -> PhaseSettings {
        PhaseSettings {
            temperature: self.classify_temperature,
            timeout: self.timeout,
        }
    }

    pub fn synthesis_settings(&self) -> PhaseSettings {
        PhaseSettings {
            temperature: self.synthesis_temperature,
            timeout: self.timeout,
        }
    }

    pub fn reprompt_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.classify_attempts,
            initial_delay: REPROMPT_INITIAL_DELAY,
            max_delay: REPROMPT_MAX_DELAY,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            classification: self.classification_settings(),
            synthesis: self.synthesis_settings(),
            reprompt: self.reprompt_policy(),
        }
    }
}

fn check_bounds<T>(field: &'static str, value: T, min: T, max: T) -> Result<T, ValidationError>
where
    T: PartialOrd + ToString + Copy,
{
    if value < min || value > max {
        return Err(ValidationError::OutOfBounds {
            field,
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        });
    }
    Ok(value)
}

fn check_temperature(field: &'static str, value: f32) -> Result<f32, ValidationError> {
    if !(0.0..=MAX_TEMPERATURE).contains(&value) {
        return Err(ValidationError::OutOfBounds {
            field,
            value: value.to_string(),
            min: "0".to_string(),
            max: MAX_TEMPERATURE.to_string(),
        });
    }
    Ok(value)
}

/// Reads a JSON Lines batch file. Blank lines are skipped; line numbers in
/// errors are 1-based.
pub fn load_requests(path: &Path) -> Result<Vec<PipelineRequest>, AppError> {
    let text = fs::read_to_string(path)?;
    let requests = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<PipelineRequest>(line).map_err(|e| {
                AppError::InvalidRequestLine {
                    path: path.display().to_string(),
                    line: i + 1,
                    message: e.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Loaded {} request(s) from {}", requests.len(), path.display());
    Ok(requests)
}
