use anyhow::Context;
use crop_predictor::{
    build_router, config::ServiceConfig, features::FeatureRanges, ArtifactPaths, ArtifactStore,
    AppState, PredictionService,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .context("invalid logging.level")?,
        )
        .init();

    let paths = ArtifactPaths::from(&config.artifacts);
    let service = match ArtifactStore::new(paths).load() {
        Ok(state) => PredictionService::new(state),
        Err(e) if config.startup.allow_degraded => {
            tracing::warn!(error = %e, "starting degraded; every prediction will fail until restart");
            PredictionService::unavailable()
        }
        Err(e) => {
            return Err(e).context("cannot start: model components not loaded");
        }
    };
    let service = service
        .with_ranges(config.validation.enforce_ranges.then(FeatureRanges::default))
        .with_vector_logging(config.logging.log_vectors);

    // Warmup so a broken ensemble shows up in the startup log
    if config.startup.warmup && service.is_ready() {
        match service.predict_sample() {
            Ok(predictions) => {
                let summary: Vec<String> = predictions
                    .iter()
                    .map(|(name, p)| format!("{}={}({:.3})", name, p.label, p.confidence))
                    .collect();
                tracing::info!("warmup prediction ok: [{}]", summary.join(", "));
            }
            Err(e) => tracing::warn!(error = %e, "warmup prediction failed"),
        }
    }

    tracing::info!("loaded models: {:?}", service.model_names());

    let app = build_router(AppState::new(service));

    let addr = config.bind_addr()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
