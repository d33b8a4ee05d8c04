pub mod config;
pub mod error;
pub mod models;
pub mod engine;
pub mod http_client;
pub mod layout_client;
pub mod booking_client;
pub mod services;
pub mod sessions;
pub mod controllers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::SyncError;
use crate::services::SyncCoordinator;
use crate::sessions::SessionRegistry;

// Shared state для всего приложения
pub struct AppState {
    pub config: config::Config,
    pub sessions: SessionRegistry,
    pub sync: SyncCoordinator,
}

impl AppState {
    pub fn new(config: config::Config) -> Result<Arc<Self>, SyncError> {
        let sync = SyncCoordinator::from_config(&config)?;
        Ok(Self::with_sync(config, sync))
    }

    /// Состояние с уже собранным координатором (другие хранилища, тесты).
    pub fn with_sync(config: config::Config, sync: SyncCoordinator) -> Arc<Self> {
        Arc::new(Self {
            config,
            sessions: SessionRegistry::new(),
            sync,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Rooming Engine API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
