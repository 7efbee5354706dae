mod config;
mod routes;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = config::DashboardConfig::resolve()?;
    tracing::info!("loading tables from {}", cfg.data_dir.display());

    let dataset = lap_evolution::load_dataset(&cfg.data_dir, &cfg.tables)
        .await
        .with_context(|| format!("failed to load F1 data from {}", cfg.data_dir.display()))?;
    let counts = dataset.counts();
    tracing::info!(
        "data loaded: races={} circuits={} lap_times={} constructors={} constructor_results={}",
        counts.races,
        counts.circuits,
        counts.lap_times,
        counts.constructors,
        counts.constructor_results
    );

    let snapshot = tokio::task::spawn_blocking(move || routes::Snapshot::build(dataset)).await?;
    if snapshot.qualifying.is_empty() {
        tracing::warn!("no qualifying circuits; map and lap charts will be empty");
    }
    if snapshot.flow.is_empty() {
        tracing::warn!("no major constructors; constructor flow will be empty");
    }

    let state = routes::AppState::new(snapshot, cfg.data_dir.clone(), cfg.tables.clone());
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.bind_addr))?;
    tracing::info!("listening on http://{}", cfg.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
