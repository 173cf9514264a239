use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use vecdex::config::Config;
use vecdex::engine::SearchEngine;
use vecdex::error::Result;
use vecdex::server::routes::build_router;
use vecdex::server::AppState;
use vecdex::storage::VecdexStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Load config first (needed for logging setup)
    let config = Config::load(None)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .init();
        }
    }

    tracing::info!("vecdex starting");
    vecdex::metrics::init();

    let store = VecdexStore::from_config(&config.storage)?;
    let engine = Arc::new(SearchEngine::from_config(store, &config));

    // Restore persisted indexes before accepting requests
    let report = engine.load_all().await?;
    for (name, error) in &report.failures {
        tracing::error!(index = %name, error = %error, "index not restored");
    }
    tracing::info!(
        restored = report.restored.len(),
        failed = report.failures.len(),
        "startup restore complete"
    );

    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %addr, "listening");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("vecdex stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
