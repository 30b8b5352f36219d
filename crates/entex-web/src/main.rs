//! entex web server
//!
//! Run with: cargo run -p entex-web

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use entex_ner::NerModel;
use entex_web::{router::build_router, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8000);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the real environment still applies.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("entex=debug,info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let settings = entex_config::settings().context("Invalid configuration")?;
    info!("{} v{}", settings.project_name, settings.version);
    info!(
        "Model: {}, default labels: {:?}",
        settings.model_name, settings.default_labels
    );
    warn!(
        "MAX_TEXT_LENGTH={} and MIN_CONFIDENCE_SCORE={} are configured but not enforced",
        settings.max_text_length, settings.min_confidence_score
    );

    let state = Arc::new(AppState::new(settings.clone()));

    info!("Starting model initialization...");
    let model = NerModel::load(&settings.model_name)
        .await
        .context("Failed to initialize model")?;
    let model = tokio::task::spawn_blocking(move || {
        model.warm_up();
        model
    })
    .await?;
    state.mark_ready(model);
    info!("Model loaded successfully.");

    let app = build_router(Arc::clone(&state));

    let addr = SocketAddr::from(BIND_ADDR);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
