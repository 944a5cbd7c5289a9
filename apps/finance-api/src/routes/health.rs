//! Liveness and database reachability.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServingStatus {
    Serving,
    NotServing,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: ServingStatus,
    pub database: bool,
    pub version: &'static str,
    pub server_time: DateTime<Utc>,
}

/// `200` while the store answers, `503` otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.store.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, ServingStatus::Serving)
    } else {
        warn!("Health check failed: database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, ServingStatus::NotServing)
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            version: env!("CARGO_PKG_VERSION"),
            server_time: Utc::now(),
        }),
    )
}
