mod auth;
mod config;
mod db;
mod errors;
mod flashcards;
mod generation;
mod learning;
mod llm_client;
mod models;
mod routes;
mod state;
mod statistics;
mod store;
#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, QueueBackend};
use crate::db::create_pool;
use crate::generation::generator::OpenRouterGenerator;
use crate::learning::queue::SessionQueueManager;
use crate::learning::redis_queue::RedisQueueStore;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting flashcards API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // Initialize session queue backend
    let queue = build_queue(&config.queue_backend).await?;

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        config.openrouter_base_url.clone(),
        config.openrouter_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let state = AppState {
        flashcards: store.clone(),
        sessions: store.clone(),
        generations: store,
        queue,
        generator: Arc::new(OpenRouterGenerator::new(llm)),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_queue(backend: &QueueBackend) -> Result<SessionQueueManager> {
    match backend {
        QueueBackend::Memory => {
            info!("Session queues held in memory; active sessions are lost on restart");
            Ok(SessionQueueManager::in_memory())
        }
        QueueBackend::Redis { url, ttl_secs } => {
            let client = redis::Client::open(url.as_str())?;
            let store = RedisQueueStore::connect(&client, *ttl_secs).await?;
            Ok(SessionQueueManager::new(Arc::new(store)))
        }
    }
}
