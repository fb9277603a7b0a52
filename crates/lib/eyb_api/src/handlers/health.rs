//! Liveness endpoints for both listeners.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::ApiState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_connected: Option<bool>,
}

/// `GET /health` on the authorization server.
pub async fn auth_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        db_connected: None,
    })
}

/// `GET /health` on the recruiting API; also probes the database.
pub async fn api_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        db_connected: Some(state.applications.ping().await),
    })
}
