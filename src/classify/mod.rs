//! Classifier adapter: capability trait + output validation + factory.
//!
//! The core treats classification as an opaque batch call satisfying a fixed
//! contract: one output per input, in input order, scores over exactly the
//! three canonical labels. Two implementations live behind the one trait — a
//! deterministic offline mock and an HTTP client for a model-backed sidecar —
//! selected by configuration, never by the caller.

pub mod mock;
pub mod remote;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{ClassifierBackend, Settings};
use crate::document::{Document, Label, Scores, LABELS};
use crate::error::{AdapterError, ConfigurationError};
use crate::explain::TokenWeight;

pub use mock::MockClassifier;
pub use remote::RemoteClassifier;

/// One classifier output: label plus the full per-label score vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: Label,
    pub scores: Scores,
}

/// External classification capability.
///
/// `classify` is batch-oriented and fails as a unit — no partial results.
/// Retry policy, timeouts, and cancellation belong to the caller.
#[async_trait]
pub trait ClassifierAdapter: Send + Sync {
    /// Classify a non-empty batch of documents with non-empty text,
    /// returning one output per input in input order.
    async fn classify(&self, batch: &[Document]) -> Result<Vec<Classification>, AdapterError>;

    /// Opaque per-token contribution signal for one document, consumed by the
    /// explainability module.
    async fn attributions(&self, document: &Document) -> Result<Vec<TokenWeight>, AdapterError>;

    /// Implementation name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Shared handle used by handlers and tests.
pub type SharedClassifier = Arc<dyn ClassifierAdapter>;

/// Build the configured adapter variant.
pub fn build_classifier(settings: &Settings) -> Result<SharedClassifier, ConfigurationError> {
    match settings.classifier_backend {
        ClassifierBackend::Mock => Ok(Arc::new(MockClassifier)),
        ClassifierBackend::Remote => {
            let url = settings.classifier_url.clone().ok_or_else(|| {
                ConfigurationError::InvalidEnv {
                    var: crate::config::ENV_CLASSIFIER_URL,
                    reason: "required when CLASSIFIER_BACKEND=remote".to_string(),
                }
            })?;
            Ok(Arc::new(RemoteClassifier::new(url)))
        }
    }
}

/// Run the adapter over a batch and attach validated results.
///
/// All outputs are validated before any document is marked: a mismatched
/// batch length, a negative score, or a label that is not the dominant score
/// fails the whole call with zero documents classified.
pub async fn classify_documents(
    adapter: &dyn ClassifierAdapter,
    documents: Vec<Document>,
) -> Result<Vec<Document>, AdapterError> {
    if documents.is_empty() {
        return Ok(documents);
    }

    let outputs = adapter.classify(&documents).await?;
    if outputs.len() != documents.len() {
        return Err(AdapterError::BatchLengthMismatch {
            expected: documents.len(),
            got: outputs.len(),
        });
    }
    for output in &outputs {
        validate_classification(output)?;
    }

    Ok(documents
        .into_iter()
        .zip(outputs)
        .map(|(doc, out)| doc.with_classification(out.label, out.scores))
        .collect())
}

fn validate_classification(output: &Classification) -> Result<(), AdapterError> {
    for label in LABELS {
        if output.scores.get(label) < 0.0 {
            return Err(AdapterError::NegativeScore { label });
        }
    }
    let dominant = output.scores.dominant();
    if output.label != dominant {
        return Err(AdapterError::LabelMismatch {
            label: output.label,
            dominant,
        });
    }
    Ok(())
}
