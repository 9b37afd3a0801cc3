//! Preprocessing pipeline engine.
//!
//! A pipeline is an ordered sequence of steps; each input is constructed into
//! a `Document`, then threaded through the steps in declared order. A step
//! returning drop terminates that item immediately; later steps never see it.
//! Items are processed independently — one malformed payload is recorded and
//! excluded while its siblings proceed.
//!
//! Step order is caller-controlled and consequential. In the default
//! composition deduplication runs after truncation, so dedup operates on
//! truncated text: two originally-distinct long texts that share a truncated
//! prefix conflate to one. That trade-off is deliberate; use
//! `dedup_before_truncate` for the exact-text alternative.

pub mod steps;

pub use steps::{collapse_whitespace, PipelineStep};

use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::document::Document;
use crate::error::{ConfigurationError, ValidationError};
use steps::RunState;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_inputs_total", "Inputs submitted to pipeline runs.");
        describe_counter!(
            "pipeline_kept_total",
            "Documents surviving all pipeline steps."
        );
        describe_counter!(
            "pipeline_rejected_total",
            "Inputs rejected at the construction/validation boundary."
        );
        describe_counter!(
            "pipeline_dropped_total",
            "Documents dropped, labeled by the dropping step."
        );
    });
}

/// One pipeline input: either a raw JSON mapping (validated at construction)
/// or an already-built `Document`.
#[derive(Debug, Clone)]
pub enum PipelineInput {
    Raw(Value),
    Document(Document),
}

impl From<Value> for PipelineInput {
    fn from(value: Value) -> Self {
        PipelineInput::Raw(value)
    }
}

impl From<Document> for PipelineInput {
    fn from(doc: Document) -> Self {
        PipelineInput::Document(doc)
    }
}

/// An input excluded at the validation boundary, with its cause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedInput {
    /// Index of the offending item in the submitted batch.
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of one batch run: survivors in input order, rejected inputs with
/// their causes, and the count dropped by steps.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub documents: Vec<Document>,
    pub rejected: Vec<RejectedInput>,
    pub dropped: usize,
}

/// Ordered, validated sequence of steps. Construction is the fail-fast point
/// for step parameters; running a batch can no longer fail as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    /// Compose from an arbitrary caller-controlled step order.
    pub fn new(steps: Vec<PipelineStep>) -> Self {
        Self { steps }
    }

    /// The baseline composition: normalize → drop-empty(1) → truncate → dedup.
    ///
    /// Dedup intentionally sees truncated text here; see the module docs.
    pub fn default_pipeline(max_text_length: usize) -> Result<Self, ConfigurationError> {
        Ok(Self::new(vec![
            PipelineStep::normalize_whitespace(),
            PipelineStep::drop_empty_text(1)?,
            PipelineStep::truncate_text(max_text_length)?,
            PipelineStep::deduplicate_by_text(),
        ]))
    }

    /// Equally supported alternative: dedup on exact full text, then truncate.
    /// Distinct long texts sharing a truncated prefix both survive.
    pub fn dedup_before_truncate(max_text_length: usize) -> Result<Self, ConfigurationError> {
        Ok(Self::new(vec![
            PipelineStep::normalize_whitespace(),
            PipelineStep::drop_empty_text(1)?,
            PipelineStep::deduplicate_by_text(),
            PipelineStep::truncate_text(max_text_length)?,
        ]))
    }

    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Thread one already-built document through the steps.
    /// `None` means some step dropped it.
    fn thread(&self, doc: Document, state: &mut RunState) -> Option<Document> {
        let mut doc = doc;
        for step in &self.steps {
            match step.apply(doc, state) {
                Some(next) => doc = next,
                None => {
                    tracing::debug!(step = step.name(), "document dropped");
                    counter!("pipeline_dropped_total", "step" => step.name()).increment(1);
                    return None;
                }
            }
        }
        Some(doc)
    }

    /// Process a batch. Stateful steps (dedup) get fresh state scoped to this
    /// call, so concurrent and consecutive runs share no history.
    pub fn run<I>(&self, inputs: I) -> BatchReport
    where
        I: IntoIterator<Item = PipelineInput>,
    {
        ensure_metrics_described();

        let mut state = RunState::default();
        let mut report = BatchReport::default();
        let mut total = 0usize;

        for (index, input) in inputs.into_iter().enumerate() {
            total += 1;
            let constructed = match input {
                PipelineInput::Document(doc) => Ok(doc),
                PipelineInput::Raw(value) => Document::from_value(&value),
            };
            match constructed {
                Ok(doc) => match self.thread(doc, &mut state) {
                    Some(doc) => report.documents.push(doc),
                    None => report.dropped += 1,
                },
                Err(error) => {
                    tracing::debug!(index, %error, "input rejected");
                    report.rejected.push(RejectedInput { index, error });
                }
            }
        }

        counter!("pipeline_inputs_total").increment(total as u64);
        counter!("pipeline_kept_total").increment(report.documents.len() as u64);
        counter!("pipeline_rejected_total").increment(report.rejected.len() as u64);

        report
    }

    /// Convenience for callers holding typed documents already.
    pub fn run_documents<I>(&self, docs: I) -> BatchReport
    where
        I: IntoIterator<Item = Document>,
    {
        self.run(docs.into_iter().map(PipelineInput::from))
    }
}
