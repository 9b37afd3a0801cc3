// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod classify;
pub mod config;
pub mod document;
pub mod error;
pub mod explain;
pub mod metrics;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::classify::{
    build_classifier, classify_documents, Classification, ClassifierAdapter, MockClassifier,
    RemoteClassifier, SharedClassifier,
};
pub use crate::document::{Document, DocumentDraft, Label, Scores, LABELS};
pub use crate::error::{AdapterError, ConfigurationError, ValidationError};
pub use crate::pipeline::{BatchReport, Pipeline, PipelineInput, PipelineStep};
