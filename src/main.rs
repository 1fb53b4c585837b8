use anyhow::Context;
use dotenv::dotenv;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use incubator_backend::{
    catalog::ModuleCatalog, config, create_router, db, i18n, progression::ProgressionEngine,
    telemetry, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = config::init()?;
    let telemetry_handles = telemetry::init_telemetry(&telemetry::TelemetryConfig::from_app(&config.app))?;

    let catalog = ModuleCatalog::load(config.app.catalog_path.as_deref())?;
    let store = db::init_store(config.database.as_ref())
        .await
        .context("Failed to initialize progress store")?;
    let localizer = i18n::init_i18n(config.app.locales_dir.as_deref())?;

    let engine = ProgressionEngine::new(store, Arc::new(catalog), config.progression_policy());
    let app = create_router(AppState::new(engine, config.clone(), localizer));

    let addr = config.server_addr();
    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Failed to serve application")?;

    telemetry_handles.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    signal::ctrl_c().await.ok();
    info!("Shutting down...");
}
