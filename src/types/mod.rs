use thiserror::Error;

mod classification;
mod domain_types;

pub use classification::*;
pub use domain_types::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid model identifier: {name} - {reason}")]
    InvalidModelId { name: String, reason: String },

    #[error("Unknown requirement category: {0} (expected one of CP, RP, ACL, TN)")]
    UnknownCategory(String),

    #[error("Value out of bounds for {field}: {value}, expected {min}..={max}")]
    OutOfBounds {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
}
