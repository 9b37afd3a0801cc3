//! # Aggregation Engine
//! Pure, testable logic that maps a batch of classified documents to
//! dashboard-ready per-ticker summaries. No I/O, no caching: every summary is
//! recomputed from scratch on each query, so retries can never observe a
//! stale partial aggregate.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::document::{utc_micros, Document, Label};

/// Window applied when the caller does not supply one.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;
/// Ranked-list length applied when the caller does not supply one.
pub const DEFAULT_TOP_N: usize = 3;

/// Per-label document counts inside one (ticker, window) group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl LabelCounts {
    fn bump(&mut self, label: Label) {
        match label {
            Label::Positive => self.positive += 1,
            Label::Neutral => self.neutral += 1,
            Label::Negative => self.negative += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

/// One ranked document in a summary: the evidence a dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub id: String,
    pub source: String,
    pub ticker: Option<String>,
    pub text: String,
    pub label: Label,
    /// Signed positive-minus-negative score; ranking uses its magnitude.
    pub leaning: f32,
    #[serde(rename = "ts", with = "utc_micros")]
    pub created_at: DateTime<Utc>,
}

/// Summary metrics for one (ticker, window) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSummary {
    pub ticker: Option<String>,
    pub window_secs: i64,
    pub counts: LabelCounts,
    /// Bounded composite in [-1, 1]: (positive − negative) / total,
    /// exactly 0.0 when nothing contributed.
    pub composite: f32,
    pub top_contributors: Vec<Contributor>,
}

/// Aggregate classified documents for one ticker (or `None` = all documents)
/// over `[now − window, now]`.
///
/// Unclassified documents and documents outside the window are skipped.
/// Ranking is deterministic: |leaning| descending, then most recent
/// `created_at`, then id.
pub fn aggregate(
    documents: &[Document],
    ticker: Option<&str>,
    window: Duration,
    now: DateTime<Utc>,
    top_n: usize,
) -> TickerSummary {
    let want = ticker.map(|t| t.trim().to_uppercase());
    let cutoff = now - window;

    let mut counts = LabelCounts::default();
    let mut contributors: Vec<Contributor> = Vec::new();

    for doc in documents {
        if let Some(want) = &want {
            if doc.ticker.as_deref() != Some(want.as_str()) {
                continue;
            }
        }
        if doc.created_at < cutoff || doc.created_at > now {
            continue;
        }
        let (label, scores) = match (doc.label, doc.scores) {
            (Some(label), Some(scores)) => (label, scores),
            _ => continue,
        };

        counts.bump(label);
        contributors.push(Contributor {
            id: doc.id.clone(),
            source: doc.source.clone(),
            ticker: doc.ticker.clone(),
            text: doc.text.clone(),
            label,
            leaning: scores.leaning(),
            created_at: doc.created_at,
        });
    }

    let total = counts.total();
    let composite = if total == 0 {
        0.0
    } else {
        (counts.positive as f32 - counts.negative as f32) / total as f32
    };

    contributors.sort_by(|a, b| {
        b.leaning
            .abs()
            .total_cmp(&a.leaning.abs())
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    contributors.truncate(top_n);

    TickerSummary {
        ticker: want,
        window_secs: window.num_seconds(),
        counts,
        composite,
        top_contributors: contributors,
    }
}

/// Dashboard overview: one summary per distinct stored ticker present in the
/// batch (documents without a ticker form their own group), sorted with the
/// no-ticker group first.
pub fn summarize_by_ticker(
    documents: &[Document],
    window: Duration,
    now: DateTime<Utc>,
    top_n: usize,
) -> Vec<TickerSummary> {
    let tickers: BTreeSet<Option<String>> =
        documents.iter().map(|d| d.ticker.clone()).collect();

    tickers
        .into_iter()
        .map(|ticker| {
            // Pre-filter the group: an unfiltered `None` query would
            // aggregate across every document, not just the ticker-less ones.
            let group: Vec<Document> = documents
                .iter()
                .filter(|d| d.ticker == ticker)
                .cloned()
                .collect();
            let summary = aggregate(&group, ticker.as_deref(), window, now, top_n);
            TickerSummary { ticker, ..summary }
        })
        .collect()
}
