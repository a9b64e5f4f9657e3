//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `edw-run` binary is the production entry point.

use api_rest::AppState;
use edw_core::CoreConfig;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the EDW REST API server.
///
/// # Environment Variables
/// - `EDW_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `EDW_STORE_URL`: Base URL of the relational store (default: "http://localhost:8000")
/// - `EDW_STORE_API_KEY`: API key sent to the store (default: empty)
/// - `EDW_AI_URL`: Assistant function endpoint (default: "http://localhost:9000/assess")
/// - `EDW_AI_PROVIDER` / `EDW_AI_MODEL`: Identity recorded on each AI run
/// - `EDW_SCRATCHPAD_DIR`: Optional draft scratchpad directory
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("EDW_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting EDW REST API on {}", addr);

    let cfg = config_from_env()?;
    let state = AppState::new(&cfg)?;
    let app = api_rest::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    let store_url =
        std::env::var("EDW_STORE_URL").unwrap_or_else(|_| "http://localhost:8000".into());
    let store_api_key = std::env::var("EDW_STORE_API_KEY").unwrap_or_default();
    let ai_url =
        std::env::var("EDW_AI_URL").unwrap_or_else(|_| "http://localhost:9000/assess".into());
    let ai_provider = std::env::var("EDW_AI_PROVIDER").unwrap_or_else(|_| "hosted-ai".into());
    let ai_model = std::env::var("EDW_AI_MODEL").unwrap_or_else(|_| "triage-1".into());
    let scratchpad_dir = std::env::var("EDW_SCRATCHPAD_DIR").ok().map(PathBuf::from);

    Ok(CoreConfig::new(
        store_url,
        store_api_key,
        ai_url,
        ai_provider,
        ai_model,
        scratchpad_dir,
    )?)
}
