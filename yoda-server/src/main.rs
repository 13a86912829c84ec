use anyhow::Context;
use clap::Parser;
use yoda_server::{AppState, ServerConfig, create_app};
use yoda_telemetry::{init_telemetry, shutdown_telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_telemetry(&config.telemetry())?;

    let state = AppState::from_config(&config)?;
    if let Err(err) = state.pipeline.retriever().initialize().await {
        // The first query retries.
        tracing::warn!(error = %err, "lexical cache warm-up failed");
    }

    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, collection = %config.collection, "yoda-server listening");

    axum::serve(listener, create_app(state)).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("shutting down");
    shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for ctrl-c");
    }
}
