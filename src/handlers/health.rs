use axum::{extract::State, response::Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::{db, errors::ServiceError, ApiResponse, AppState};

/// Liveness probe. Succeeds whenever the process is serving requests.
pub async fn health() -> Result<Json<ApiResponse<Value>>, ServiceError> {
    Ok(Json(ApiResponse::success(json!({
        "status": "ok",
        "service": "gridpulse-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}

/// Readiness probe. Fails with 503 while the database is unreachable.
pub async fn readiness(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    db::check_connection(&state.db).await.map_err(|e| {
        error!(error = %e, "Readiness probe failed to reach database");
        ServiceError::ServiceUnavailable("database unreachable".to_string())
    })?;

    Ok(Json(ApiResponse::success(json!({
        "status": "ready",
        "checks": { "database": "healthy" },
        "timestamp": Utc::now().to_rfc3339(),
    }))))
}
