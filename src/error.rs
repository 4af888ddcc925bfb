// src/error.rs
//! Application error types with structured error handling.
//!
//! Three layers of failure vocabulary live here:
//!
//! - [`InferenceError`]: what the inference capability can report.
//! - [`PipelineFailure`]: the taxonomy a pipeline run can end in.
//! - [`AppError`]: everything the command-line front end can hit.
//!
//! A model that refuses to guess (`<INSUFFICIENT_DATA: ...>`) or declares a
//! requirement non-applicable is *not* an error and has no variant here; see
//! [`crate::synthesis_output::SynthesisOutcome`].

use std::time::Duration;
use thiserror::Error;

/// Failure reported by an inference backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// The endpoint could not be reached at the connection level.
    #[error("inference endpoint unreachable: {reason}")]
    Unreachable { reason: String },

    /// No complete response arrived within the allotted time.
    #[error("no response from inference endpoint within {}s", after.as_secs_f32())]
    Timeout { after: Duration },

    /// The endpoint answered, but with an error or an unreadable body.
    #[error("inference endpoint answered with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// The ways a pipeline run can fail.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineFailure {
    #[error("requirement rejected before inference: {reason}")]
    InvalidRequirement { reason: String },

    #[error("cannot reach the inference backend: {reason}")]
    BackendUnreachable { reason: String },

    #[error("inference backend did not answer within {}s", after.as_secs_f32())]
    BackendTimeout { after: Duration },

    #[error("inference backend rejected the request (HTTP {status}): {message}")]
    BackendRejected { status: u16, message: String },

    #[error("model did not return a valid classification: {reason}")]
    MalformedClassification { reason: String },

    #[error("model returned an empty configuration response")]
    EmptySynthesis,

    #[error("prompt template could not be rendered: {reason}")]
    PromptTemplate { reason: String },
}

impl PipelineFailure {
    /// Stable name of the failure kind, used as the prefix of user-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequirement { .. } => "InvalidRequirement",
            Self::BackendUnreachable { .. } => "BackendUnreachable",
            Self::BackendTimeout { .. } => "BackendTimeout",
            Self::BackendRejected { .. } => "BackendRejected",
            Self::MalformedClassification { .. } => "MalformedClassification",
            Self::EmptySynthesis => "EmptySynthesis",
            Self::PromptTemplate { .. } => "PromptTemplate",
        }
    }

    /// Whether the failure came from the transport rather than the model's content.
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::BackendUnreachable { .. }
                | Self::BackendTimeout { .. }
                | Self::BackendRejected { .. }
        )
    }

    /// `"<Kind>: <description>"`, the form surfaced to callers.
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

impl From<InferenceError> for PipelineFailure {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::Unreachable { reason } => Self::BackendUnreachable { reason },
            InferenceError::Timeout { after } => Self::BackendTimeout { after },
            InferenceError::Rejected { status, message } => {
                Self::BackendRejected { status, message }
            }
        }
    }
}

impl From<crate::types::ValidationError> for PipelineFailure {
    fn from(err: crate::types::ValidationError) -> Self {
        Self::InvalidRequirement {
            reason: err.to_string(),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template file not found at {path}: {source}")]
    TemplateNotFound {
        path: String,
        source: std::io::Error,
    },

    #[error("Template error for template {name}: {message}")]
    TemplateRenderError { name: String, message: String },

    #[error("Invalid request on line {line} of {path}: {message}")]
    InvalidRequestLine {
        path: String,
        line: usize,
        message: String,
    },

    #[error("Inference backend is not ready: {0}")]
    BackendNotReady(String),

    #[error("{failed} of {total} pipeline run(s) failed")]
    RunsFailed { failed: usize, total: usize },

    #[error("Malformed JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),
}

impl From<std::fmt::Error> for AppError {
    fn from(err: std::fmt::Error) -> Self {
        AppError::TemplateRenderError {
            name: "report".to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_errors_map_onto_backend_failures() {
        let unreachable: PipelineFailure = InferenceError::Unreachable {
            reason: "connection refused".into(),
        }
        .into();
        assert_eq!(unreachable.kind(), "BackendUnreachable");
        assert!(unreachable.is_backend_failure());

        let timeout: PipelineFailure = InferenceError::Timeout {
            after: Duration::from_secs(300),
        }
        .into();
        assert_eq!(
            timeout,
            PipelineFailure::BackendTimeout {
                after: Duration::from_secs(300)
            }
        );

        let rejected: PipelineFailure = InferenceError::Rejected {
            status: 404,
            message: "model not found".into(),
        }
        .into();
        assert_eq!(rejected.kind(), "BackendRejected");
    }

    #[test]
    fn describe_prefixes_the_kind() {
        let failure = PipelineFailure::MalformedClassification {
            reason: "missing key `steps`".into(),
        };
        assert_eq!(
            failure.describe(),
            "MalformedClassification: model did not return a valid classification: missing key `steps`"
        );
        assert!(!failure.is_backend_failure());
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let failure = PipelineFailure::BackendTimeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(
            failure.to_string(),
            "inference backend did not answer within 1.5s"
        );
    }
}
