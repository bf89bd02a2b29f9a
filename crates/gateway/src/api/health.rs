//! Liveness and readiness probes.

use axum::extract::State;
use axum::response::{IntoResponse, Json};

use crate::api::error::ApiResult;
use crate::state::AppState;

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Ready when the database answers and, if a cluster client is configured,
/// the apiserver does too.
pub async fn readyz(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.store.ping().await?;
    if let Some(cluster) = &state.cluster {
        cluster.ping().await?;
    }
    Ok(Json(serde_json::json!({ "status": "ready" })))
}
