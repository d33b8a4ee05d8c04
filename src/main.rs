use anyhow::Context;
use mimalloc::MiMalloc;
use std::net::SocketAddr;
use tokio::task;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rooming_engine::{
    app,
    config::{Config, LogFormat},
    AppState,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::load().context("Failed to load configuration")?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    match config.app.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Fmt => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    info!("Starting Rooming Engine ({})", config.app.environment);
    info!("Layout store: {}", config.layout_store.base_url);
    info!("Bookings: {}", config.bookings.base_url);

    let app_state = AppState::new(config.clone()).context("Failed to build store clients")?;

    // --- Start background tasks ---

    // Task to evict idle rooming sessions every `eviction_interval_seconds`
    let state_for_bg = app_state.clone();
    let idle_ttl = config.sessions.idle_ttl();
    let interval = config.sessions.eviction_interval();
    task::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let evicted = state_for_bg.sessions.evict_idle(idle_ttl).await;
            if evicted > 0 {
                info!("Evicted {} idle rooming sessions", evicted);
            }
        }
    });

    // --- Start the web server ---

    let app = app(app_state).layer(CorsLayer::permissive());

    let host: std::net::IpAddr = config
        .app
        .host
        .parse()
        .with_context(|| format!("Invalid host {}", config.app.host))?;
    let addr = SocketAddr::from((host, config.app.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
