//! HTTP surface
//!
//! Routes, shared state, and middleware (CORS, tracing, body limit) for the
//! gateway. Handlers live in [`handlers`].

pub mod extract;
pub mod handlers;

use crate::ai::CompletionService;
use crate::models::{AnalysisMode, Config};
use crate::pipeline::LeafPipeline;
use crate::Result;
use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

/// Process-scoped state shared by every handler. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub ai: Arc<dyn CompletionService>,
    pub pipeline: Arc<LeafPipeline>,
    pub analysis_mode: AnalysisMode,
}

impl AppState {
    pub fn new(ai: Arc<dyn CompletionService>, analysis_mode: AnalysisMode) -> Self {
        Self {
            ai,
            pipeline: Arc::new(LeafPipeline::for_mode(analysis_mode)),
            analysis_mode,
        }
    }
}

/// Any origin, method, and header, with credentials.
///
/// Origins and headers are mirrored back because the CORS protocol forbids
/// `*` when credentials are allowed.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/analyze-rice-leaf", post(handlers::analyze_rice_leaf))
        .route("/agriculture-chatbot", post(handlers::agriculture_chatbot))
        .route("/weather-insights", post(handlers::weather_insights))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %Uuid::new_v4(),
                )
            }),
        )
        .layer(cors_layer())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &Config, ai: Arc<dyn CompletionService>) -> Result<()> {
    let state = AppState::new(ai, config.analysis_mode);
    let app = build_router(state, config.max_upload_bytes);

    let listener = TcpListener::bind(config.bind_addr.as_str()).await?;
    info!(
        "Listening on {} (analysis mode: {})",
        listener.local_addr()?,
        config.analysis_mode
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
