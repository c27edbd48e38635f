//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes driving the report generator, store and viewer
//! - JSON error responses built from `AppError`

pub mod routes;

#[cfg(test)]
mod tests;

use axum::Router;
use rentdesk_client::ReportBackend;
use rentdesk_core::reports::{
    ReportError, ReportFormat, ReportGenerator, ReportStore, ReportType, ReportViewer,
    ShareMethod, ViewerListener,
};
use rentdesk_shared::AppConfig;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Logs completed viewer actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionLog;

impl ViewerListener for ActionLog {
    fn on_export(&self, report_type: ReportType, format: ReportFormat) {
        info!(%report_type, %format, "Report exported");
    }

    fn on_share(&self, report_type: ReportType, method: ShareMethod) {
        info!(%report_type, %method, "Report shared");
    }

    fn on_print(&self, report_type: ReportType) {
        info!(%report_type, "Report printed");
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Report state store.
    pub store: Arc<ReportStore<ReportBackend>>,
    /// Report generator controller.
    pub generator: Arc<ReportGenerator<ReportBackend>>,
    /// Report viewer actions.
    pub viewer: Arc<ReportViewer<ReportBackend, ActionLog>>,
}

impl AppState {
    /// Wires the store, generator and viewer around `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured share URL is invalid.
    pub fn new(config: &AppConfig, backend: ReportBackend) -> Result<Self, ReportError> {
        let store = Arc::new(ReportStore::with_history_capacity(
            backend,
            config.store.history_capacity,
        ));
        let generator = Arc::new(ReportGenerator::new(Arc::clone(&store), &config.generator));
        let viewer = Arc::new(
            ReportViewer::new(Arc::clone(&store), &config.share.public_base_url)?
                .with_listener(ActionLog),
        );

        Ok(Self {
            store,
            generator,
            viewer,
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
