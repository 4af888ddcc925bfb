// src/lib.rs
//! netconfig-gen library — turns natural-language network requirements into
//! Cisco IOS configuration with a local LLM.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `PipelineFailure`, `InferenceError`, `ValidationError`
//! - **Configuration** — `CommandLineInput`, `PipelineConfig`, `Workload`
//! - **Domain types** — `Requirement`, `TopologyInfo`, `Category`, `Classification`
//! - **Inference** — `InferenceBackend`, `OllamaClient`, `BoundedBackend`
//! - **Pipeline** — `Classifier`, `ConfigSynthesizer`, `Pipeline`, `PipelineResult`
//! - **Output** — rendering and delivery of results

pub mod classifier;
pub mod config;
pub mod constants;
pub mod error;
pub mod error_recovery;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod synthesis_output;
pub mod synthesizer;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, InferenceError, PipelineFailure};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{load_requests, CommandLineInput, OutputFormat, PipelineConfig, Workload};

// --- Domain Types ---
pub use crate::types::{Category, Classification, ModelId, Requirement, TopologyInfo, ValidatedUrl};

// --- Inference ---
pub use crate::inference::{
    complete_within, BackendHealth, BackendSettings, BoundedBackend, CompletionRequest,
    InferenceBackend, OllamaClient,
};

// --- Pipeline ---
pub use crate::classifier::{parse_classification, Classifier, PhaseSettings};
pub use crate::error_recovery::RetryPolicy;
pub use crate::pipeline::{
    Pipeline, PipelineOutcome, PipelineRequest, PipelineResult, PipelineSettings, Stage,
};
pub use crate::prompts::PromptTemplates;
pub use crate::synthesis_output::{
    parse_device_blocks, parse_synthesis_output, DeviceConfigBlock, SynthesisOutcome,
};
pub use crate::synthesizer::ConfigSynthesizer;
