// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! them should tell you how the pipeline talks to the model: where it
//! expects the model server, how long it waits, and how conservative
//! each prompting phase is.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Inference backend
// ---------------------------------------------------------------------------

/// Base URL of a locally running Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Model served by the local Ollama instance.
pub const DEFAULT_MODEL_ID: &str = "llama3.1:8b-instruct-q8_0";

/// Environment variable overriding the backend base URL.
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";

/// Environment variable overriding the model identifier.
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";

/// How long a single generation may take.
///
/// Local generation on consumer hardware routinely takes tens of seconds,
/// and the first call after a model load can take minutes.
pub const DEFAULT_INFERENCE_TIMEOUT: Duration = Duration::from_secs(300);

/// How long the health probe waits for the model server.
pub const HEALTH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Concurrent generations allowed against one model server.
pub const DEFAULT_BACKEND_CONCURRENCY: usize = 1;

/// Upper bound for `--concurrency`.
pub const MAX_BACKEND_CONCURRENCY: usize = 32;

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Classification temperature: low, but not greedy.
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.1;

/// Synthesis temperature: as close to deterministic as the backend allows.
pub const SYNTHESIS_TEMPERATURE: f32 = 0.01;

/// Highest temperature accepted from configuration.
pub const MAX_TEMPERATURE: f32 = 2.0;

// ---------------------------------------------------------------------------
// Classification re-prompting
// ---------------------------------------------------------------------------

/// Classification attempts per run. One attempt means fail-fast.
pub const DEFAULT_CLASSIFY_ATTEMPTS: u32 = 1;

/// Upper bound for `--classify-attempts`.
pub const MAX_CLASSIFY_ATTEMPTS: u32 = 5;

/// First delay between classification attempts.
pub const REPROMPT_INITIAL_DELAY: Duration = Duration::from_millis(500);

/// Cap for the exponential delay between classification attempts.
pub const REPROMPT_MAX_DELAY: Duration = Duration::from_secs(8);

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing model output or error bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
