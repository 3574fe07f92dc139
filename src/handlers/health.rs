use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::database::ClassStore;

#[derive(Clone)]
pub struct HealthState {
    /// Absent when only the auth handler is deployed
    pub store: Option<Arc<dyn ClassStore>>,
}

/// GET /health - Liveness, plus store reachability when the data handler is mounted
pub async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(store) = state.store else {
        return (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "skipped" })),
        );
    };

    match store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}
