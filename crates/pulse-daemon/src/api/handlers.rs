use super::responses::*;
use super::ApiState;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub async fn root() -> Json<ServiceInfo> {
    let endpoints = BTreeMap::from([
        ("health", "GET /health"),
        ("sync_status", "GET /sync/status"),
        ("trigger_sync", "POST /sync/trigger"),
    ]);

    Json(ServiceInfo {
        name: "Pulse",
        version: env!("CARGO_PKG_VERSION"),
        description: "Storage node fleet synchronization service",
        endpoints,
    })
}

pub async fn health(State(state): State<Arc<ApiState>>) -> Response {
    let report = state.scheduler.orchestrator().health_check().await;
    let code = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = HealthResponse {
        status: if report.healthy { "healthy" } else { "unhealthy" },
        timestamp: Utc::now(),
        rpc_reachable: report.rpc_reachable,
        store_reachable: report.store_reachable,
        reason: report.reason,
        uptime_secs: state.started_at.elapsed().as_secs(),
        sync: state.scheduler.status(),
    };

    (code, Json(body)).into_response()
}

pub async fn sync_status(State(state): State<Arc<ApiState>>) -> Response {
    Json(state.scheduler.status()).into_response()
}

/// Fire and forget. The outcome shows up in `/sync/status`.
pub async fn trigger_sync(State(state): State<Arc<ApiState>>) -> Json<TriggerResponse> {
    info!("Sync trigger received over HTTP");
    state.scheduler.trigger_detached();

    Json(TriggerResponse {
        message: "Sync triggered",
        timestamp: Utc::now(),
    })
}

pub async fn not_found(uri: Uri) -> (StatusCode, Json<NotFoundResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            error: "Not found",
            path: uri.path().to_string(),
        }),
    )
}
