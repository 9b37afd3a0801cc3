//! Sentiment Pipeline Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::net::SocketAddr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ticker_sentiment_pipeline::{api, classify, config, metrics};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let settings = config::Settings::from_env()?;
    let classifier = classify::build_classifier(&settings)?;
    tracing::info!(backend = classifier.name(), "classifier adapter ready");

    let prom = metrics::Metrics::init(settings.max_text_length);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.api_port));
    let state = api::AppState::new(settings, classifier);
    let router = api::create_router(state).merge(prom.router());

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
