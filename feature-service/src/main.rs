use anyhow::Result;
use feature_service::{
    api::{self, AppState},
    config::AppConfig,
    metrics_server, observability, Predictor,
};
use std::{net::SocketAddr, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;
    let server = AppConfig::section(&cfg.server, "server")?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    // Loaded once; a missing model leaves the service up but not ready.
    let predictor = Predictor::load(&server.model_path);
    let state = Arc::new(AppState::new(predictor));

    let addr: SocketAddr = server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "prediction service listening");

    axum::serve(listener, api::router(state).into_make_service()).await?;

    Ok(())
}
