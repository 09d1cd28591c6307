//! TeenBuddy - a supportive chat companion for teenagers
//!
//! Serves a browser chat page, keeps every conversation in a JSON file, and
//! asks a hosted text-generation model for each reply.

mod api;
mod config;
mod llm;
mod registry;
mod reply;
mod runtime;
mod store;

use api::{create_router, AppState};
use config::AppConfig;
use reply::ResponseGenerator;
use runtime::ChatRuntime;
use std::net::SocketAddr;
use std::sync::Arc;
use store::HistoryFile;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "teenbuddy=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env()?;

    if config.inference.api_token.is_none() {
        tracing::warn!("API_TOKEN is not set; every reply will be the fallback message");
    }

    let llm = llm::build_service(&config.inference);
    tracing::info!(
        model = %llm.model_id(),
        url = %config.inference.base_url,
        timeout_secs = config.inference.timeout.as_secs(),
        "Inference service configured"
    );

    let store = Arc::new(HistoryFile::new(config.history_file.clone()));
    tracing::info!(path = %store.path().display(), "Opening chat history");
    let runtime = ChatRuntime::start(store, ResponseGenerator::new(llm)).await;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(AppState::new(runtime))
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(config.bind, config.port);
    tracing::info!("TeenBuddy listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
