mod circuit_breaker;
mod config;
mod errors;
mod handlers;
mod models;
mod notifications;
mod pdf;
mod pipeline;
mod recorder;
mod research;
mod scoring;
mod services;
mod style_guide;
mod web_presence;

use axum::{
    routing::{get, post},
    Router,
};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{NotionService, OpenAiService, PostmarkService};
use crate::web_presence::WebPresenceAnalyzer;

/// Main entry point for the application.
///
/// Initializes logging, configuration, and the external service clients,
/// then starts the Axum server. Clients are constructed exactly once here
/// and injected through the shared state; nothing reads the environment
/// after startup.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // One HTTP client shared across all outbound services; per-request
    // timeouts are set at each call site.
    let http = reqwest::Client::new();

    let openai = OpenAiService::from_config(&config, http.clone());
    if openai.is_some() {
        tracing::info!("✓ Generative service client initialized");
    }
    let notion = NotionService::new(&config, http.clone());
    tracing::info!("✓ CRM client initialized: {}", config.notion_base_url);
    let postmark = PostmarkService::new(&config, http.clone());
    tracing::info!("✓ Email client initialized: {}", config.postmark_base_url);
    let presence = WebPresenceAnalyzer::new(http);

    // Dedup cache for rapid duplicate submissions (10 minute TTL)
    let recent_submission_cache = Cache::builder()
        .time_to_live(Duration::from_secs(600))
        .max_capacity(10_000)
        .build();
    tracing::info!("Submission dedup cache initialized");

    // Build application state
    let app_state = Arc::new(handlers::AppState {
        config: config.clone(),
        openai,
        notion,
        postmark,
        presence,
        recent_submission_cache,
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Build protected routes with security layers
    let protected_routes = Router::new()
        .route("/api/v1/leads", post(handlers::submit_lead))
        .route("/api/v1/leads/import", post(handlers::import_lead))
        .layer(
            ServiceBuilder::new()
                // Request size limit: 1MB max payload (submissions are small JSON)
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                // Rate limiting: 10 req/sec per IP, burst of 20
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Build final app with health check (bypasses rate limiting)
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
