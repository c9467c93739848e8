//! listing-agents HTTP Server
//!
//! Axum-based server exposing the chat, search and real-estate agents,
//! plus a small property catalog that grounds the real-estate agent.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{ConfigResolver, ToolServerConnector};
use agent_runtime::{McpHttpClient, OpenAiProvider};
use real_estate::MemoryListingStore;

use crate::handlers::{
    capabilities_handler, chat_handler, create_property, delete_property, get_property,
    health_check, list_properties, root, search_handler, update_property,
};
use crate::state::{AgentFactory, AppState};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";

pub(crate) fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/", get(root))
        // Agent API
        .route("/api/chat", post(chat_handler))
        .route("/api/search", post(search_handler))
        .route("/api/agents/capabilities", get(capabilities_handler))
        // Property catalog
        .route("/api/properties", get(list_properties).post(create_property))
        .route(
            "/api/properties/{id}",
            get(get_property)
                .put(update_property)
                .delete(delete_property),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let resolver = ConfigResolver::from_env();
    let configuration = resolver.resolve();
    let tool_credential = resolver.resolve_tool_credential();

    tracing::info!(
        endpoint = configuration.endpoint_url(),
        model = configuration.model(),
        "Agent configuration resolved"
    );
    if configuration.has_placeholder_credential() {
        tracing::warn!("⚠ LLM credential not set - backend calls will likely be rejected");
    }
    if tool_credential.is_none() {
        tracing::warn!("⚠ Web search credential not set - agents will run without tools");
    }

    let provider = Arc::new(OpenAiProvider::from_configuration(&configuration)?);
    let connector = ToolServerConnector::new(Arc::new(McpHttpClient::with_defaults()));

    let listings = Arc::new(MemoryListingStore::sample());
    tracing::info!("Loaded {} demo listings", listings.len().await);

    let factory = AgentFactory {
        configuration,
        tool_credential,
        provider,
        connector,
        listings: listings.clone(),
    };
    let app = router(AppState::new(factory, listings));

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 listing-agents server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                  - Health check");
    tracing::info!("  POST /api/chat                - Run an agent");
    tracing::info!("  POST /api/search              - Web search with summary");
    tracing::info!("  GET  /api/agents/capabilities - Agent capabilities");
    tracing::info!("  GET  /api/properties          - List properties");
    tracing::info!("  PUT  /api/properties/{{id}}     - Update a property");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
