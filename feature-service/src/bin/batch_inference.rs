use anyhow::Result;
use feature_service::{
    config::AppConfig,
    inference,
    model::LinearModel,
    observability,
    pipeline::{Sink, Source},
    sinks::CsvDatasetSink,
    sources::RawCsvFileSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;
    let inference_cfg = AppConfig::section(&cfg.inference, "inference")?;

    let model = LinearModel::load(&inference_cfg.model_path)?;
    tracing::info!(path = %inference_cfg.model_path.display(), "model loaded");

    let dataset = RawCsvFileSource::new(&inference_cfg.dataset_path).load().await?;
    let predictions = inference::score_table(&model, &dataset)?;

    CsvDatasetSink::new(&inference_cfg.output_path)
        .write(&predictions)
        .await?;
    tracing::info!(
        rows = predictions.height(),
        path = %inference_cfg.output_path.display(),
        "predictions saved"
    );

    Ok(())
}
