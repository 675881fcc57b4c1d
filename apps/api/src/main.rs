mod admin;
mod auth;
mod catalog;
mod config;
mod errors;
mod llm_client;
mod matching;
mod models;
mod profile;
mod routes;
mod state;
mod store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::matching::orchestrator::CourseMatchOrchestrator;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::supabase::SupabaseStore;
use crate::store::RecordStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Transfer API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the record store client
    let store: Arc<dyn RecordStore> = Arc::new(SupabaseStore::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    ));
    info!("Record store client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_base_url.clone(),
        config.app_referer.clone(),
        config.app_title.clone(),
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let orchestrator = Arc::new(CourseMatchOrchestrator::new(store.clone(), llm));
    let state = AppState {
        store,
        orchestrator,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
