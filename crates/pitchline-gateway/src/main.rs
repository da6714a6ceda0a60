use std::net::SocketAddr;
use tracing::info;

mod adapters;
mod app;
mod error;
mod http;
mod identity;
mod rate_limit;
mod ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitchline_gateway=info,tower_http=debug".into()),
        )
        .init();

    let config_path = std::env::var("PITCHLINE_CONFIG").ok();
    let config = pitchline_core::config::PitchlineConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("config load failed ({}), using defaults", e);
        pitchline_core::config::PitchlineConfig::default()
    });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let (state, worker, shutdown_tx) = app::AppState::build(config)?;
    app::spawn_ingest_worker(worker, shutdown_tx.subscribe());

    let router = app::build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("pitchline gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;

    let _ = shutdown_tx.send(true);
    Ok(())
}
