mod config;
mod db;
mod errors;
mod export;
mod extract;
mod gateway;
mod llm_client;
mod models;
mod normalize;
mod resumes;
mod routes;
mod state;
mod store;
mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::export::archive::ExportArchive;
use crate::gateway::LlmGateway;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryVersionStore, PgVersionStore, RetryingStore, VersionStore};

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

    info!("Starting resume API v{}", env!("CARGO_PKG_VERSION"));

    // Version store, wrapped in the transient-failure retry policy
    let policy = config.retry_policy();
    let store: Arc<dyn VersionStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url).await?;
            Arc::new(RetryingStore::new(PgVersionStore::new(pool), policy))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory store (data is lost on restart)");
            Arc::new(RetryingStore::new(MemoryVersionStore::new(), policy))
        }
    };

    // Initialize LLM client and gateway
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);
    let gateway = Arc::new(LlmGateway::new(llm));

    // Export archive (optional)
    let archive = match &config.archive {
        Some(archive_config) => {
            let archive = ExportArchive::connect(archive_config).await;
            info!("Export archiving enabled (bucket: {})", archive_config.bucket);
            Some(archive)
        }
        None => None,
    };

    let state = AppState {
        store,
        gateway,
        archive,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restricts origins to `FRONTEND_URL` when set, otherwise permissive.
fn cors_layer(config: &Config) -> CorsLayer {
    let Some(frontend) = &config.frontend_url else {
        return CorsLayer::permissive();
    };
    match frontend.trim_end_matches('/').parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any),
        Err(e) => {
            warn!("FRONTEND_URL '{frontend}' is not a valid origin ({e}); CORS left permissive");
            CorsLayer::permissive()
        }
    }
}
