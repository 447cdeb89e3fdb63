use super::*;
use crate::fleet::{FleetRead, FleetSource};
use crate::storage::SledFleetStore;
use crate::sync::SyncOrchestrator;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use pulse_types::PulseResult;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tower::ServiceExt;

struct StubFleet {
    reachable: AtomicBool,
    reads: AtomicUsize,
}

#[async_trait]
impl FleetSource for StubFleet {
    async fn fetch_fleet(&self) -> PulseResult<FleetRead> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(FleetRead::default())
    }

    async fn reachable(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

fn app(reachable: bool) -> (Router, Arc<StubFleet>) {
    let fleet = Arc::new(StubFleet {
        reachable: AtomicBool::new(reachable),
        reads: AtomicUsize::new(0),
    });
    let store = Arc::new(SledFleetStore::in_memory().unwrap());
    let orchestrator = Arc::new(SyncOrchestrator::new(fleet.clone(), store));
    let scheduler = Arc::new(Scheduler::new(orchestrator, 60));
    (router(Arc::new(ApiState::new(scheduler)), true), fleet)
}

async fn send(app: Router, method: &str, path: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().method(method).uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_root_lists_endpoints() {
    let (app, _) = app(true);
    let (status, body) = send(app, "GET", "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Pulse");
    assert_eq!(body["endpoints"]["trigger_sync"], "POST /sync/trigger");
}

#[tokio::test]
async fn test_health_ok_when_fleet_and_store_reachable() {
    let (app, _) = app(true);
    let (status, body) = send(app, "GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body.get("reason").is_none());
    assert_eq!(body["sync"]["interval_secs"], 60);
}

#[tokio::test]
async fn test_health_unavailable_when_fleet_unreachable() {
    let (app, _) = app(false);
    let (status, body) = send(app, "GET", "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["rpc_reachable"], false);
    assert_eq!(body["store_reachable"], true);
    assert!(body["reason"].as_str().unwrap().contains("unreachable"));
}

#[tokio::test]
async fn test_sync_status_shape() {
    let (app, _) = app(true);
    let (status, body) = send(app, "GET", "/sync/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["armed"], false);
    assert_eq!(body["timer"], "cron");
    assert_eq!(body["cadence"]["kind"], "every_n_minutes");
    assert_eq!(body["sync"]["is_running"], false);
    assert_eq!(body["sync"]["nodes_synced"], 0);
}

#[tokio::test]
async fn test_trigger_returns_immediately_and_runs_in_background() {
    let (app, fleet) = app(true);
    let (status, body) = send(app, "POST", "/sync/trigger").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sync triggered");

    for _ in 0..50 {
        if fleet.reads.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(fleet.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let (app, _) = app(true);
    let (status, body) = send(app, "GET", "/nodes/unknown").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
    assert_eq!(body["path"], "/nodes/unknown");
}

#[tokio::test]
async fn test_trigger_requires_post() {
    let (app, _) = app(true);
    let response = app
        .oneshot(Request::builder().uri("/sync/trigger").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
