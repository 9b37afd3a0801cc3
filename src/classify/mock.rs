//! Deterministic offline classifier for tests and local runs without a model.
//!
//! Scores are derived from a SHA-256 hash of the text: stable per text,
//! varied across texts, so batching and aggregation behave realistically
//! without any network or model weights.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Classification, ClassifierAdapter};
use crate::document::{Document, Scores};
use crate::error::AdapterError;
use crate::explain::TokenWeight;

pub struct MockClassifier;

/// Stable hash of `text` mapped into [0, 1).
fn text_hash_unit(text: &str) -> f32 {
    let digest = Sha256::digest(text.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) % 1000) as f32 / 1000.0
}

fn score_text(text: &str) -> Classification {
    let h = text_hash_unit(text);
    // Small variation around an even split; stable per text.
    let positive = 0.33 + (h - 0.5) * 0.02;
    let negative = 0.33 - (h - 0.5) * 0.01;
    let neutral = (1.0 - positive - negative).max(0.0);
    let scores = Scores {
        positive,
        neutral,
        negative,
    };
    Classification {
        label: scores.dominant(),
        scores,
    }
}

#[async_trait]
impl ClassifierAdapter for MockClassifier {
    async fn classify(&self, batch: &[Document]) -> Result<Vec<Classification>, AdapterError> {
        Ok(batch.iter().map(|doc| score_text(&doc.text)).collect())
    }

    /// Whitespace tokens with hash-derived weights in [-0.5, 0.5).
    async fn attributions(&self, document: &Document) -> Result<Vec<TokenWeight>, AdapterError> {
        let text = &document.text;
        let mut spans: Vec<(usize, usize)> = Vec::new();
        let mut start: Option<usize> = None;
        for (i, ch) in text.char_indices() {
            if ch.is_whitespace() {
                if let Some(s) = start.take() {
                    spans.push((s, i));
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            spans.push((s, text.len()));
        }

        Ok(spans
            .into_iter()
            .map(|(start, end)| TokenWeight {
                start,
                end,
                weight: text_hash_unit(&text[start..end]) - 0.5,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_scores_identically() {
        let a = score_text("Fed signals patience");
        let b = score_text("Fed signals patience");
        assert_eq!(a, b);
    }

    #[test]
    fn scores_are_nonnegative_and_label_is_dominant() {
        for text in ["up", "down", "sideways", "Apple beats earnings"] {
            let out = score_text(text);
            assert!(out.scores.positive >= 0.0);
            assert!(out.scores.neutral >= 0.0);
            assert!(out.scores.negative >= 0.0);
            assert_eq!(out.label, out.scores.dominant());
        }
    }
}
