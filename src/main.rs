use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fire_watch::{csv_log::CsvLog, model::Model, router, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fire_watch=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env();

    let model = Model::load(&cfg.model_path, &cfg.encoder_path).with_context(|| {
        format!(
            "failed to load model {} / encoder {}",
            cfg.model_path.display(),
            cfg.encoder_path.display()
        )
    })?;
    tracing::info!(
        "loaded model {}; classes: {:?}",
        cfg.model_path.display(),
        model.encoder().classes()
    );

    // Warmup so a model/encoder mismatch fails startup, not the first request
    let (idx, label) = model
        .classify(&[0.0; fire_watch::model::N_FEATURES])
        .context("warmup prediction failed")?;
    tracing::info!("warmup forward ok: {} ({})", label, idx);

    let log = CsvLog::open(&cfg.log_csv)
        .with_context(|| format!("failed to open prediction log {}", cfg.log_csv.display()))?;
    tracing::info!("appending predictions to {}", log.path().display());

    let mut state = AppState::new(model, log);
    state.log_predictions = cfg.log_predictions;

    let app = router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
