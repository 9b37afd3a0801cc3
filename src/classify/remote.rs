//! HTTP client for a model-backed inference sidecar.
//!
//! The sidecar owns model loading and tokenization; this client only speaks
//! the wire contract (`POST /classify`, `POST /attributions`). Transport
//! failures and non-2xx responses surface as `AdapterError::Unavailable`;
//! content-level violations are caught by the core's output validation.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{Classification, ClassifierAdapter};
use crate::document::Document;
use crate::error::AdapterError;
use crate::explain::TokenWeight;

pub struct RemoteClassifier {
    http: reqwest::Client,
    base_url: String,
}

impl RemoteClassifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ticker-sentiment-pipeline/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, AdapterError>
    where
        B: Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::Unavailable(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AdapterError::Unavailable(format!(
                "{} returned {}",
                url,
                resp.status()
            )));
        }
        resp.json::<T>()
            .await
            .map_err(|e| AdapterError::Unavailable(format!("invalid response body: {e}")))
    }
}

#[derive(Serialize)]
struct ClassifyItem<'a> {
    id: &'a str,
    text: &'a str,
}

#[async_trait]
impl ClassifierAdapter for RemoteClassifier {
    async fn classify(&self, batch: &[Document]) -> Result<Vec<Classification>, AdapterError> {
        let items: Vec<ClassifyItem<'_>> = batch
            .iter()
            .map(|doc| ClassifyItem {
                id: &doc.id,
                text: &doc.text,
            })
            .collect();
        self.post_json("/classify", &items).await
    }

    async fn attributions(&self, document: &Document) -> Result<Vec<TokenWeight>, AdapterError> {
        let item = ClassifyItem {
            id: &document.id,
            text: &document.text,
        };
        self.post_json("/attributions", &item).await
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
