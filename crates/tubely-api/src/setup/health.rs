//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - database and object store are reachable.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut response = serde_json::json!({
        "status": "ready",
        "database": "not_configured",
        "storage": "unknown"
    });
    let mut overall_ready = true;

    if let Some(pool) = &state.pool {
        match tokio::time::timeout(CHECK_TIMEOUT, sqlx::query("SELECT 1").execute(pool)).await {
            Ok(Ok(_)) => response["database"] = serde_json::json!("ready"),
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Database readiness check failed");
                response["database"] = serde_json::json!("not_ready");
                overall_ready = false;
            }
            Err(_) => {
                tracing::error!("Database readiness check timed out");
                response["database"] = serde_json::json!("timeout");
                overall_ready = false;
            }
        }
    }

    match tokio::time::timeout(CHECK_TIMEOUT, state.storage.health_check()).await {
        Ok(Ok(())) => response["storage"] = serde_json::json!("ready"),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Storage readiness check failed");
            response["storage"] = serde_json::json!("not_ready");
            overall_ready = false;
        }
        Err(_) => {
            tracing::error!("Storage readiness check timed out");
            response["storage"] = serde_json::json!("timeout");
            overall_ready = false;
        }
    }

    if overall_ready {
        (StatusCode::OK, Json(response))
    } else {
        response["status"] = serde_json::json!("not_ready");
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}
