//! HTTP glue around the core: thin handlers that wire the pipeline, the
//! classifier adapter, the aggregation engine, and the explain shaper to a
//! dashboard-facing Router. No pipeline or aggregation logic lives here.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};

use crate::aggregate::{self, TickerSummary, DEFAULT_TOP_N};
use crate::classify::{classify_documents, SharedClassifier};
use crate::config::Settings;
use crate::document::Document;
use crate::error::{AdapterError, ConfigurationError};
use crate::explain::{shape_highlights, Highlight, DEFAULT_EPSILON};
use crate::pipeline::{Pipeline, PipelineInput};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub classifier: SharedClassifier,
}

impl AppState {
    pub fn new(settings: Settings, classifier: SharedClassifier) -> Self {
        Self {
            settings,
            classifier,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .route("/aggregate", post(aggregate_query))
        .route("/aggregate/overview", post(aggregate_overview))
        .route("/explain", post(explain))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .cors_allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

// ---- error mapping ----

#[derive(Debug)]
enum ApiFailure {
    BadRequest(String),
    Adapter(AdapterError),
    Config(ConfigurationError),
}

impl From<AdapterError> for ApiFailure {
    fn from(e: AdapterError) -> Self {
        ApiFailure::Adapter(e)
    }
}

impl From<ConfigurationError> for ApiFailure {
    fn from(e: ConfigurationError) -> Self {
        ApiFailure::Config(e)
    }
}

#[derive(Serialize)]
struct ApiErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiFailure::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiFailure::Adapter(e) => (StatusCode::BAD_GATEWAY, "CLASSIFIER_ERROR", e.to_string()),
            ApiFailure::Config(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                e.to_string(),
            ),
        };
        (status, Json(ApiErrorBody { code, message })).into_response()
    }
}

// ---- /analyze ----

#[derive(Serialize)]
struct RejectedItem {
    index: usize,
    error: String,
}

#[derive(Serialize)]
struct AnalyzeResp {
    documents: Vec<Document>,
    rejected: Vec<RejectedItem>,
    dropped: usize,
}

/// Run a raw batch through the default pipeline and the classifier.
/// Invalid items come back under `rejected`; their siblings proceed.
async fn analyze(
    State(state): State<AppState>,
    Json(items): Json<Vec<Value>>,
) -> Result<Json<AnalyzeResp>, ApiFailure> {
    if items.len() > state.settings.max_upload_rows {
        return Err(ApiFailure::BadRequest(format!(
            "batch exceeds {} rows",
            state.settings.max_upload_rows
        )));
    }

    let pipeline = Pipeline::default_pipeline(state.settings.max_text_length)?;
    let report = pipeline.run(items.into_iter().map(PipelineInput::from));
    let documents = classify_documents(state.classifier.as_ref(), report.documents).await?;

    Ok(Json(AnalyzeResp {
        documents,
        rejected: report
            .rejected
            .into_iter()
            .map(|r| RejectedItem {
                index: r.index,
                error: r.error.to_string(),
            })
            .collect(),
        dropped: report.dropped,
    }))
}

// ---- /aggregate ----

#[derive(Deserialize)]
struct AggregateReq {
    documents: Vec<Document>,
    #[serde(default)]
    ticker: Option<String>,
    #[serde(default)]
    window_hours: Option<i64>,
    #[serde(default)]
    top_n: Option<usize>,
}

async fn aggregate_query(
    State(state): State<AppState>,
    Json(req): Json<AggregateReq>,
) -> Json<TickerSummary> {
    let window = Duration::hours(
        req.window_hours
            .unwrap_or(state.settings.default_window_hours),
    );
    Json(aggregate::aggregate(
        &req.documents,
        req.ticker.as_deref(),
        window,
        Utc::now(),
        req.top_n.unwrap_or(DEFAULT_TOP_N),
    ))
}

async fn aggregate_overview(
    State(state): State<AppState>,
    Json(req): Json<AggregateReq>,
) -> Json<Vec<TickerSummary>> {
    let window = Duration::hours(
        req.window_hours
            .unwrap_or(state.settings.default_window_hours),
    );
    Json(aggregate::summarize_by_ticker(
        &req.documents,
        window,
        Utc::now(),
        req.top_n.unwrap_or(DEFAULT_TOP_N),
    ))
}

// ---- /explain ----

#[derive(Serialize)]
struct ExplainResp {
    id: String,
    highlights: Vec<Highlight>,
}

async fn explain(
    State(state): State<AppState>,
    Json(document): Json<Document>,
) -> Result<Json<ExplainResp>, ApiFailure> {
    let signal = state.classifier.attributions(&document).await?;
    let highlights = shape_highlights(&document, &signal, DEFAULT_EPSILON)?;
    Ok(Json(ExplainResp {
        id: document.id.clone(),
        highlights,
    }))
}
