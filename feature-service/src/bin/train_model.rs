use anyhow::Result;
use feature_service::{
    config::AppConfig,
    metrics_server, observability,
    pipeline::Source,
    sources::RawCsvFileSource,
    training,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let training_cfg = AppConfig::section(&cfg.training, "training")?;

    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr);
    }

    let dataset = RawCsvFileSource::new(&training_cfg.dataset_path).load().await?;
    tracing::info!(
        rows = dataset.height(),
        path = %training_cfg.dataset_path.display(),
        "feature dataset loaded"
    );

    let model = training::train(&dataset, training_cfg.split_options())?;
    model.save(&training_cfg.model_path)?;
    tracing::info!(path = %training_cfg.model_path.display(), "model saved");

    Ok(())
}
