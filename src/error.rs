//! Error taxonomy shared across the pipeline, classification, and config layers.
//!
//! Three families, matching where a failure can originate:
//! - `ValidationError`: a single input payload is malformed (per-item, never
//!   aborts a batch).
//! - `AdapterError`: the classifier misbehaved (whole-batch, not retried here).
//! - `ConfigurationError`: bad step parameters or env values (fail-fast, before
//!   any batch is processed).

use thiserror::Error;

use crate::document::Label;

/// A single document payload failed validation at the construction boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("payload must be a JSON object")]
    NotAnObject,

    #[error("document source is required")]
    MissingSource,

    #[error("document text is required")]
    MissingText,
}

/// The classifier (or its attribution signal) violated the adapter contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdapterError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier returned {got} results for a batch of {expected}")]
    BatchLengthMismatch { expected: usize, got: usize },

    #[error("classifier returned a negative score for '{label}'")]
    NegativeScore { label: Label },

    #[error("classifier label '{label}' does not match the dominant score '{dominant}'")]
    LabelMismatch { label: Label, dominant: Label },

    #[error("malformed attribution signal: {0}")]
    MalformedSignal(String),
}

/// Invalid step parameters or environment values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{step}: {param} must be >= 1")]
    InvalidStepParam {
        step: &'static str,
        param: &'static str,
    },

    #[error("invalid value for {var}: {reason}")]
    InvalidEnv { var: &'static str, reason: String },
}
