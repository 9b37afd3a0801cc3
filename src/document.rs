//! Canonical document schema used across ingestion adapters, the pipeline,
//! and the aggregation layer.
//!
//! Construction is a validating boundary: a `Document` either exists with all
//! invariants holding (non-empty id/source/text, UTC timestamp, upper-cased
//! ticker) or you get a `ValidationError`. Nothing partially valid escapes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::ValidationError;

/// Canonical 3-way sentiment label. Declaration order is the tie-break order
/// for `Scores::dominant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Neutral,
    Negative,
}

/// Canonical label order used across the crate.
pub const LABELS: [Label; 3] = [Label::Positive, Label::Neutral, Label::Negative];

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "positive",
            Label::Neutral => "neutral",
            Label::Negative => "negative",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-label probability-like scores returned by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub positive: f32,
    pub neutral: f32,
    pub negative: f32,
}

impl Scores {
    pub fn get(&self, label: Label) -> f32 {
        match label {
            Label::Positive => self.positive,
            Label::Neutral => self.neutral,
            Label::Negative => self.negative,
        }
    }

    /// Highest-scoring label; ties resolve to the earliest label in
    /// declaration order (positive, neutral, negative).
    pub fn dominant(&self) -> Label {
        let mut best = Label::Positive;
        for label in LABELS {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }

    /// Signed positive-minus-negative leaning, the per-document sentiment
    /// magnitude used by ranking and explain output.
    pub fn leaning(&self) -> f32 {
        self.positive - self.negative
    }
}

/// Serde helpers for the canonical timestamp wire form: ISO-8601 UTC with
/// microsecond precision and an explicit `Z` marker. Deserialization accepts
/// any RFC 3339 offset and normalizes to UTC.
pub mod utc_micros {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// Canonical normalized record of one text item.
///
/// Flows by value through pipeline steps; each step returns a new/modified
/// value or a drop signal, so a `Document` held elsewhere is never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub source: String,
    pub ticker: Option<String>,
    #[serde(with = "utc_micros")]
    pub created_at: DateTime<Utc>,
    pub text: String,
    pub permalink: Option<String>,
    /// Attached by the classification step, not at construction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<Scores>,
}

/// Loosely-typed construction input for `Document::new`. All fields optional
/// except `source` and `text`, mirroring what upload rows and ingestion
/// adapters actually provide.
#[derive(Debug, Clone, Default)]
pub struct DocumentDraft {
    pub id: Option<String>,
    pub source: Option<String>,
    pub ticker: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub permalink: Option<String>,
}

impl Document {
    /// Validating constructor. Empty/missing `source` or `text` is a hard
    /// failure; an empty `id` gets a fresh UUID v4; `ticker` is trimmed,
    /// upper-cased, and collapsed to `None` when empty.
    pub fn new(draft: DocumentDraft) -> Result<Self, ValidationError> {
        let source = draft
            .source
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingSource)?;
        let text = draft
            .text
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingText)?;
        let id = match draft.id {
            Some(id) if !id.is_empty() => id,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        Ok(Self {
            id,
            source,
            ticker: normalize_ticker(draft.ticker),
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            text,
            permalink: draft.permalink,
            label: None,
            scores: None,
        })
    }

    /// Construct from a raw JSON mapping (the pipeline's loosely-typed input).
    ///
    /// `created_at` may be an RFC 3339 string with any offset; it is
    /// normalized to UTC. Absent or unparseable timestamps fall back to the
    /// current instant — only `source` and `text` are hard failures.
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;
        Document::new(DocumentDraft {
            id: string_field(obj, "id"),
            source: string_field(obj, "source"),
            ticker: string_field(obj, "ticker"),
            created_at: obj.get("created_at").and_then(parse_timestamp),
            text: string_field(obj, "text"),
            permalink: string_field(obj, "permalink"),
        })
    }

    /// Convert an adapter-specific payload into a `Document`.
    ///
    /// Known adapters get their `source` pinned (`upload` rows carry text,
    /// optional ticker/timestamp); anything else is interpreted as canonical
    /// fields.
    pub fn from_adapter(adapter_name: &str, payload: &Value) -> Result<Self, ValidationError> {
        match adapter_name {
            "upload" => {
                let obj = payload.as_object().ok_or(ValidationError::NotAnObject)?;
                Document::new(DocumentDraft {
                    id: string_field(obj, "id"),
                    source: Some("upload".to_string()),
                    ticker: string_field(obj, "ticker"),
                    created_at: obj.get("created_at").and_then(parse_timestamp),
                    text: string_field(obj, "text"),
                    permalink: string_field(obj, "permalink"),
                })
            }
            _ => Document::from_value(payload),
        }
    }

    /// Attach a classification, consuming self (pipeline-style value flow).
    pub fn with_classification(mut self, label: Label, scores: Scores) -> Self {
        self.label = Some(label);
        self.scores = Some(scores);
        self
    }

    /// Canonical timestamp string as it appears on the wire.
    pub fn created_at_wire(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Signed sentiment leaning in [-1, 1]; 0.0 when unclassified.
    pub fn leaning(&self) -> f32 {
        self.scores.map(|s| s.leaning()).unwrap_or(0.0)
    }
}

/// Trim + upper-case; empty collapses to `None` so aggregation never groups
/// by an empty-string ticker.
pub fn normalize_ticker(ticker: Option<String>) -> Option<String> {
    ticker.and_then(|t| {
        let t = t.trim().to_uppercase();
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    })
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn draft(source: &str, text: &str) -> DocumentDraft {
        DocumentDraft {
            source: Some(source.to_string()),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn empty_source_or_text_is_rejected() {
        let err = Document::new(draft("", "hello")).unwrap_err();
        assert_eq!(err, ValidationError::MissingSource);

        let err = Document::new(draft("news", "")).unwrap_err();
        assert_eq!(err, ValidationError::MissingText);
    }

    #[test]
    fn missing_id_gets_generated_and_supplied_id_is_kept() {
        let d = Document::new(draft("news", "hello")).unwrap();
        assert!(!d.id.is_empty());

        let mut with_id = draft("news", "hello");
        with_id.id = Some("abc-123".to_string());
        let d = Document::new(with_id).unwrap();
        assert_eq!(d.id, "abc-123");
    }

    #[test]
    fn ticker_is_uppercased_and_empty_becomes_absent() {
        let mut dr = draft("news", "hello");
        dr.ticker = Some("aapl".to_string());
        assert_eq!(Document::new(dr).unwrap().ticker.as_deref(), Some("AAPL"));

        let mut dr = draft("news", "hello");
        dr.ticker = Some("  ".to_string());
        assert_eq!(Document::new(dr).unwrap().ticker, None);
    }

    #[test]
    fn offset_timestamps_normalize_to_utc() {
        let v = json!({
            "source": "news",
            "text": "hello",
            "created_at": "2025-03-01T10:00:00+02:00"
        });
        let d = Document::from_value(&v).unwrap();
        assert_eq!(d.created_at_wire(), "2025-03-01T08:00:00.000000Z");
    }

    #[test]
    fn unparseable_created_at_falls_back_to_now() {
        let before = Utc::now();
        let v = json!({ "source": "news", "text": "hello", "created_at": "not a date" });
        let d = Document::from_value(&v).unwrap();
        assert!(d.created_at >= before && d.created_at <= Utc::now());
    }

    #[test]
    fn wire_round_trip_preserves_every_field() {
        let created = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let mut dr = draft("reddit", "TSLA to the moon");
        dr.id = Some("r1".to_string());
        dr.ticker = Some("tsla".to_string());
        dr.created_at = Some(created);
        dr.permalink = Some("https://example.test/r1".to_string());
        let doc = Document::new(dr).unwrap().with_classification(
            Label::Positive,
            Scores {
                positive: 0.7,
                neutral: 0.2,
                negative: 0.1,
            },
        );

        let wire = serde_json::to_string(&doc).unwrap();
        assert!(wire.contains("\"2025-01-02T03:04:05.000000Z\""));

        let back: Document = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.created_at_wire(), doc.created_at_wire());
    }

    #[test]
    fn dominant_label_breaks_ties_in_declaration_order() {
        let even = Scores {
            positive: 0.4,
            neutral: 0.4,
            negative: 0.2,
        };
        assert_eq!(even.dominant(), Label::Positive);

        let tail_tie = Scores {
            positive: 0.2,
            neutral: 0.4,
            negative: 0.4,
        };
        assert_eq!(tail_tie.dominant(), Label::Neutral);
    }

    #[test]
    fn upload_adapter_payload_pins_source() {
        let payload = json!({ "text": "earnings beat", "ticker": "msft" });
        let d = Document::from_adapter("upload", &payload).unwrap();
        assert_eq!(d.source, "upload");
        assert_eq!(d.ticker.as_deref(), Some("MSFT"));
    }
}
