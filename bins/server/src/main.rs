//! Rentdesk report server
//!
//! Serves the report pipeline over HTTP.

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rentdesk_api::{AppState, create_router};
use rentdesk_client::ReportBackend;
use rentdesk_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let backend = ReportBackend::from_config(&config.report_api)?;
    let state = AppState::new(&config, backend)?;
    info!(
        history_capacity = config.store.history_capacity,
        tick_interval_ms = config.generator.tick_interval_ms,
        share_base = %config.share.public_base_url,
        "Report pipeline ready"
    );

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
