//! Standard preprocessing steps.
//!
//! Steps are plain values; anything stateful (deduplication) keeps its state
//! in the engine's per-run `RunState`, so two batch runs never share history.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::collections::HashSet;

use crate::document::{normalize_ticker, Document};
use crate::error::ConfigurationError;

/// One transformation/filter applied to a `Document`.
///
/// Parameters are validated by the constructor functions; the engine applies
/// steps strictly in declared order and never reorders or deduplicates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    /// Collapse whitespace runs to a single space and trim. Never drops.
    NormalizeWhitespace,
    /// Drop when the post-trim char count is below `min_len`. No transformation.
    DropEmptyText { min_len: usize },
    /// Keep at most `max_len` chars. Never drops.
    TruncateText { max_len: usize },
    /// Drop every item after the first whose text (as seen at this point in
    /// the pipeline) was already observed in this batch run.
    DeduplicateByText,
    /// Upper-case the ticker if present; empty collapses to absent. Never drops.
    UppercaseTicker,
}

/// Mutable state scoped to a single engine invocation over one batch.
/// Instantiated fresh per run; sharing it across batches is a correctness bug.
#[derive(Debug, Default)]
pub struct RunState {
    pub(crate) seen_texts: HashSet<String>,
}

impl PipelineStep {
    pub fn normalize_whitespace() -> Self {
        PipelineStep::NormalizeWhitespace
    }

    pub fn drop_empty_text(min_len: usize) -> Result<Self, ConfigurationError> {
        if min_len < 1 {
            return Err(ConfigurationError::InvalidStepParam {
                step: "drop_empty_text",
                param: "min_len",
            });
        }
        Ok(PipelineStep::DropEmptyText { min_len })
    }

    pub fn truncate_text(max_len: usize) -> Result<Self, ConfigurationError> {
        if max_len < 1 {
            return Err(ConfigurationError::InvalidStepParam {
                step: "truncate_text",
                param: "max_len",
            });
        }
        Ok(PipelineStep::TruncateText { max_len })
    }

    pub fn deduplicate_by_text() -> Self {
        PipelineStep::DeduplicateByText
    }

    pub fn uppercase_ticker() -> Self {
        PipelineStep::UppercaseTicker
    }

    /// Step name for telemetry and batch reports.
    pub fn name(&self) -> &'static str {
        match self {
            PipelineStep::NormalizeWhitespace => "normalize_whitespace",
            PipelineStep::DropEmptyText { .. } => "drop_empty_text",
            PipelineStep::TruncateText { .. } => "truncate_text",
            PipelineStep::DeduplicateByText => "deduplicate_by_text",
            PipelineStep::UppercaseTicker => "uppercase_ticker",
        }
    }

    /// Apply to one document: `Some` keeps (possibly modified), `None` drops.
    pub(crate) fn apply(&self, doc: Document, state: &mut RunState) -> Option<Document> {
        match *self {
            PipelineStep::NormalizeWhitespace => {
                let mut doc = doc;
                doc.text = collapse_whitespace(&doc.text);
                Some(doc)
            }
            PipelineStep::DropEmptyText { min_len } => {
                if doc.text.trim().chars().count() < min_len {
                    None
                } else {
                    Some(doc)
                }
            }
            PipelineStep::TruncateText { max_len } => {
                let mut doc = doc;
                if doc.text.chars().count() > max_len {
                    doc.text = doc.text.chars().take(max_len).collect();
                }
                Some(doc)
            }
            PipelineStep::DeduplicateByText => {
                // Exact equality on the text as transformed by all prior
                // steps; running this after truncation therefore conflates
                // long texts sharing a truncated prefix.
                if state.seen_texts.insert(doc.text.clone()) {
                    Some(doc)
                } else {
                    None
                }
            }
            PipelineStep::UppercaseTicker => {
                let mut doc = doc;
                doc.ticker = normalize_ticker(doc.ticker.take());
                Some(doc)
            }
        }
    }
}

/// Collapse runs of whitespace to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(s, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentDraft;

    fn doc(text: &str) -> Document {
        Document::new(DocumentDraft {
            source: Some("test".to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn collapse_whitespace_trims_and_squeezes() {
        assert_eq!(collapse_whitespace("  a\t\tb \n c  "), "a b c");
        assert_eq!(collapse_whitespace(" \n\t "), "");
    }

    #[test]
    fn step_params_below_one_fail_fast() {
        assert!(PipelineStep::drop_empty_text(0).is_err());
        assert!(PipelineStep::truncate_text(0).is_err());
        assert!(PipelineStep::drop_empty_text(1).is_ok());
        assert!(PipelineStep::truncate_text(1).is_ok());
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        let step = PipelineStep::truncate_text(3).unwrap();
        let mut state = RunState::default();
        let out = step.apply(doc("čočka"), &mut state).unwrap();
        assert_eq!(out.text, "čoč");
    }

    #[test]
    fn drop_empty_text_uses_post_trim_length() {
        let step = PipelineStep::drop_empty_text(3).unwrap();
        let mut state = RunState::default();
        assert!(step.apply(doc("  ab  "), &mut state).is_none());
        assert!(step.apply(doc(" abc "), &mut state).is_some());
    }

    #[test]
    fn dedup_drops_repeats_within_one_state() {
        let step = PipelineStep::deduplicate_by_text();
        let mut state = RunState::default();
        assert!(step.apply(doc("same"), &mut state).is_some());
        assert!(step.apply(doc("same"), &mut state).is_none());
        assert!(step.apply(doc("other"), &mut state).is_some());
    }
}
