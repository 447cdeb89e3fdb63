//! Operational HTTP surface: health, sync status and the manual trigger.

mod handlers;
mod responses;

pub use responses::*;

use crate::scheduler::Scheduler;
use axum::routing::{get, post};
use axum::Router;
use pulse_types::{PulseError, PulseResult};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiState {
    pub scheduler: Arc<Scheduler>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self {
            scheduler,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: Arc<ApiState>, cors_enabled: bool) -> Router {
    let app = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/sync/status", get(handlers::sync_status))
        .route("/sync/trigger", post(handlers::trigger_sync))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    }
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, app: Router, shutdown: F) -> PulseResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PulseError::Network(format!("Failed to bind API on {}: {}", addr, e)))?;

    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| PulseError::Network(format!("API server error: {}", e)))
}

#[cfg(test)]
mod tests;
