use axum::{extract::DefaultBodyLimit, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creditsea_api::config::Config;
use creditsea_api::handlers::{self, AppState};
use creditsea_api::storage::ReportStore;

/// Main entry point for the application.
///
/// Initializes logging, configuration, and the storage backend, then starts
/// the Axum server with rate limiting, body-size limiting, CORS, and request
/// tracing.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "creditsea_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Pick the storage backend once; a failed Postgres connection degrades to
    // the in-memory store instead of refusing to start.
    let store = match config.database_url.as_deref() {
        Some(url) => match ReportStore::connect_postgres(url).await {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(
                    "Postgres connection failed ({}); falling back to in-memory storage",
                    e
                );
                ReportStore::memory()
            }
        },
        None => ReportStore::memory(),
    };
    tracing::info!("Storage backend: {}", store.backend_name());

    let max_file_size = config.max_file_size;
    let app_state = Arc::new(AppState { store, config: config.clone() });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Body limits leave headroom above the file cap for multipart framing;
    // axum's own extractor limit must be raised past its 2MB default too.
    let protected_routes = handlers::router(app_state).layer(
        ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(max_file_size + 64 * 1024))
            .layer(RequestBodyLimitLayer::new(max_file_size + 64 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
