use crate::scheduler::SchedulerStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub rpc_reachable: bool,
    pub store_reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub uptime_secs: u64,
    pub sync: SchedulerStatus,
}

#[derive(Serialize)]
pub struct TriggerResponse {
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub path: String,
}
