// tests/classify_adapter.rs
use async_trait::async_trait;
use serde_json::json;

use ticker_sentiment_pipeline::explain::TokenWeight;
use ticker_sentiment_pipeline::{
    classify_documents, AdapterError, Classification, ClassifierAdapter, Document, Label,
    MockClassifier, Scores,
};

fn docs(texts: &[&str]) -> Vec<Document> {
    texts
        .iter()
        .map(|t| Document::from_value(&json!({ "source": "news", "text": t })).unwrap())
        .collect()
}

#[tokio::test]
async fn mock_classifier_attaches_labels_in_input_order() {
    let batch = docs(&["Fed holds rates", "Oil slides", "Chips rally"]);
    let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();

    let out = classify_documents(&MockClassifier, batch).await.unwrap();
    assert_eq!(out.len(), 3);
    for (doc, text) in out.iter().zip(&texts) {
        assert_eq!(&doc.text, text);
        let label = doc.label.expect("label attached");
        let scores = doc.scores.expect("scores attached");
        assert_eq!(label, scores.dominant());
    }
}

#[tokio::test]
async fn mock_classifier_is_deterministic_per_text() {
    let a = classify_documents(&MockClassifier, docs(&["same input"]))
        .await
        .unwrap();
    let b = classify_documents(&MockClassifier, docs(&["same input"]))
        .await
        .unwrap();
    assert_eq!(a[0].label, b[0].label);
    assert_eq!(a[0].scores, b[0].scores);
}

#[tokio::test]
async fn empty_batch_short_circuits_without_calling_the_adapter() {
    struct PanicAdapter;

    #[async_trait]
    impl ClassifierAdapter for PanicAdapter {
        async fn classify(&self, _: &[Document]) -> Result<Vec<Classification>, AdapterError> {
            panic!("must not be called for an empty batch");
        }
        async fn attributions(&self, _: &Document) -> Result<Vec<TokenWeight>, AdapterError> {
            Ok(Vec::new())
        }
        fn name(&self) -> &'static str {
            "panic"
        }
    }

    let out = classify_documents(&PanicAdapter, Vec::new()).await.unwrap();
    assert!(out.is_empty());
}

#[tokio::test]
async fn mismatched_batch_length_marks_zero_documents() {
    struct ShortBatchAdapter;

    #[async_trait]
    impl ClassifierAdapter for ShortBatchAdapter {
        async fn classify(&self, batch: &[Document]) -> Result<Vec<Classification>, AdapterError> {
            let scores = Scores {
                positive: 0.5,
                neutral: 0.3,
                negative: 0.2,
            };
            Ok(batch
                .iter()
                .skip(1)
                .map(|_| Classification {
                    label: scores.dominant(),
                    scores,
                })
                .collect())
        }
        async fn attributions(&self, _: &Document) -> Result<Vec<TokenWeight>, AdapterError> {
            Ok(Vec::new())
        }
        fn name(&self) -> &'static str {
            "short"
        }
    }

    let batch = docs(&["one", "two"]);
    let kept = batch.clone();

    let err = classify_documents(&ShortBatchAdapter, batch).await.unwrap_err();
    assert_eq!(
        err,
        AdapterError::BatchLengthMismatch {
            expected: 2,
            got: 1
        }
    );
    // The caller's documents remain unclassified.
    assert!(kept.iter().all(|d| d.label.is_none() && d.scores.is_none()));
}

#[tokio::test]
async fn label_disagreeing_with_scores_fails_the_whole_batch() {
    struct LyingAdapter;

    #[async_trait]
    impl ClassifierAdapter for LyingAdapter {
        async fn classify(&self, batch: &[Document]) -> Result<Vec<Classification>, AdapterError> {
            Ok(batch
                .iter()
                .map(|_| Classification {
                    label: Label::Negative,
                    scores: Scores {
                        positive: 0.9,
                        neutral: 0.05,
                        negative: 0.05,
                    },
                })
                .collect())
        }
        async fn attributions(&self, _: &Document) -> Result<Vec<TokenWeight>, AdapterError> {
            Ok(Vec::new())
        }
        fn name(&self) -> &'static str {
            "lying"
        }
    }

    let err = classify_documents(&LyingAdapter, docs(&["x"])).await.unwrap_err();
    assert_eq!(
        err,
        AdapterError::LabelMismatch {
            label: Label::Negative,
            dominant: Label::Positive,
        }
    );
}
