use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthCheckResponse {
    status: String,
}

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthCheckResponse>) {
    let (code, status) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Store ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "degraded")
        }
    };
    let response = HealthCheckResponse {
        status: status.to_string(),
    };
    (code, Json(response))
}
