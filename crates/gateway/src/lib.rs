//! HTTP gateway for ragchat.
//!
//! Exposes the chat pipeline over REST, serves the embedded chat UI,
//! and reports health.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;
pub mod error;
pub mod extract;
pub mod frontend;

#[cfg(test)]
mod test_support;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use ragchat_agent::{ChatService, ContextAssembler, ResponseGenerator};
use ragchat_config::{AppConfig, GatewayConfig};
use ragchat_core::embedding::Embedder;
use ragchat_core::provider::ChatProvider;
use ragchat_core::store::VectorStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub config: AppConfig,
    pub service: ChatService,
}

pub type SharedState = Arc<GatewayState>;

/// Wire the pipeline from already-constructed clients.
pub fn build_state(
    config: AppConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    provider: Arc<dyn ChatProvider>,
) -> SharedState {
    let assembler = ContextAssembler::new(embedder, store);
    let generator = ResponseGenerator::from_config(provider, &config.llm);
    let service = ChatService::from_config(assembler, generator, &config);
    Arc::new(GatewayState { config, service })
}

/// Build the full router: chat API, health, and the embedded UI.
///
/// Layers applied:
/// - CORS (permissive unless origins are configured)
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let gateway = state.config.gateway.clone();
    let ui = state.config.ui.clone();

    Router::new()
        .route("/health", get(health_handler))
        .merge(api::api_router(state))
        .merge(frontend::frontend_router(&ui))
        .layer(DefaultBodyLimit::max(gateway.max_body_bytes))
        .layer(cors_layer(&gateway))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
///
/// Clients for the embedding services, the vector store, and the model
/// runtime are built once here and shared by every request.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let embedder: Arc<dyn Embedder> = Arc::new(ragchat_embeddings::HttpEmbedder::from_config(&config.embeddings));
    let store = ragchat_store::build_from_config(&config.store);
    let provider: Arc<dyn ChatProvider> = Arc::new(ragchat_providers::OllamaProvider::from_config(&config.llm));

    info!(
        store = store.name(),
        model = %config.llm.model,
        top_n = config.pipeline.top_n,
        "Pipeline configured"
    );

    let app = build_router(build_state(config, embedder, store, provider));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
