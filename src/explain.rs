//! Explainability shaping: turn the classifier's opaque per-token
//! contribution signal into display-ready highlighted spans.
//!
//! Output invariants: spans cover the full original text in order, with no
//! gaps and no overlaps. Unattributed stretches (whitespace between tokens)
//! become zero-contribution neutral spans. Adjacent same-sign spans are
//! coalesced for display; spans of opposite sign are never merged.

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::AdapterError;

/// Contribution below this magnitude counts as neutral.
pub const DEFAULT_EPSILON: f32 = 1e-3;

/// One attributed token from the adapter: byte span into the document text
/// plus a signed contribution weight toward the predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenWeight {
    pub start: usize,
    pub end: usize,
    pub weight: f32,
}

/// Direction of a span's contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sign {
    Positive,
    Negative,
    Neutral,
}

/// One display span: slice bounds, the text itself, contribution magnitude,
/// and sign.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub magnitude: f32,
    pub sign: Sign,
}

fn sign_of(weight: f32, epsilon: f32) -> Sign {
    if weight.abs() < epsilon {
        Sign::Neutral
    } else if weight > 0.0 {
        Sign::Positive
    } else {
        Sign::Negative
    }
}

/// Shape the adapter's signal into highlights for `document.text`.
///
/// The signal must be sorted, in-bounds, non-overlapping, and aligned to
/// UTF-8 character boundaries; anything else is a malformed adapter output.
pub fn shape_highlights(
    document: &Document,
    signal: &[TokenWeight],
    epsilon: f32,
) -> Result<Vec<Highlight>, AdapterError> {
    let text = &document.text;
    validate_signal(text, signal)?;

    // Full coverage: attributed tokens interleaved with zero-weight gaps.
    let mut segments: Vec<(usize, usize, f32)> = Vec::with_capacity(signal.len() * 2 + 1);
    let mut cursor = 0usize;
    for tw in signal {
        if cursor < tw.start {
            segments.push((cursor, tw.start, 0.0));
        }
        segments.push((tw.start, tw.end, tw.weight));
        cursor = tw.end;
    }
    if cursor < text.len() {
        segments.push((cursor, text.len(), 0.0));
    }

    // Coalesce adjacent same-sign segments; merged magnitude is the
    // length-weighted mean so it stays on the per-token scale.
    let mut merged: Vec<(usize, usize, f32, Sign)> = Vec::new();
    for (start, end, weight) in segments {
        let sign = sign_of(weight, epsilon);
        match merged.last_mut() {
            Some((prev_start, prev_end, prev_weight, prev_sign)) if *prev_sign == sign => {
                let prev_len = (*prev_end - *prev_start) as f32;
                let len = (end - start) as f32;
                *prev_weight = (*prev_weight * prev_len + weight * len) / (prev_len + len);
                *prev_end = end;
            }
            _ => merged.push((start, end, weight, sign)),
        }
    }

    Ok(merged
        .into_iter()
        .map(|(start, end, weight, sign)| Highlight {
            start,
            end,
            text: text[start..end].to_string(),
            magnitude: weight.abs(),
            sign,
        })
        .collect())
}

fn validate_signal(text: &str, signal: &[TokenWeight]) -> Result<(), AdapterError> {
    let mut prev_end = 0usize;
    for tw in signal {
        if tw.start >= tw.end {
            return Err(AdapterError::MalformedSignal(format!(
                "empty or inverted span {}..{}",
                tw.start, tw.end
            )));
        }
        if tw.end > text.len() {
            return Err(AdapterError::MalformedSignal(format!(
                "span {}..{} exceeds text length {}",
                tw.start,
                tw.end,
                text.len()
            )));
        }
        if tw.start < prev_end {
            return Err(AdapterError::MalformedSignal(format!(
                "span {}..{} overlaps or is out of order",
                tw.start, tw.end
            )));
        }
        if !text.is_char_boundary(tw.start) || !text.is_char_boundary(tw.end) {
            return Err(AdapterError::MalformedSignal(format!(
                "span {}..{} splits a character",
                tw.start, tw.end
            )));
        }
        prev_end = tw.end;
    }
    Ok(())
}
