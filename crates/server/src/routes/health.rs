use crate::envelope::Envelope;
use crate::state::ServerState;
use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;

/// Liveness payload
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub service: &'static str,
    pub version: &'static str,
    pub store: String,
    pub uptime_seconds: u64,
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check(State(state): State<Arc<ServerState>>) -> Envelope<HealthStatus> {
    Envelope::success(HealthStatus {
        service: "querygate-server",
        version: env!("CARGO_PKG_VERSION"),
        store: state.gateway.store().name().to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
