use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::bounded_limit;
use crate::entities::{alert, threshold_config, Severity};
use crate::services::alerts::ThresholdUpdate;
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: i64,
    pub point_id: Option<String>,
    pub device_id: Option<i64>,
    pub alert_type: String,
    pub severity: String,
    pub message: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<alert::Model> for AlertResponse {
    fn from(model: alert::Model) -> Self {
        Self {
            id: model.id,
            point_id: model.point_id,
            device_id: model.device_id,
            alert_type: model.alert_type.as_str().to_string(),
            severity: model.severity.as_str().to_string(),
            message: model.message,
            value: model.value,
            threshold: model.threshold,
            created_at: model.created_at,
            resolved_at: model.resolved_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThresholdConfigResponse {
    pub id: i32,
    pub point_id: Option<String>,
    pub device_id: Option<i64>,
    pub metric: String,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub severity: String,
}

impl From<threshold_config::Model> for ThresholdConfigResponse {
    fn from(model: threshold_config::Model) -> Self {
        Self {
            id: model.id,
            point_id: model.point_id,
            device_id: model.device_id,
            metric: model.metric,
            min_value: model.min_value,
            max_value: model.max_value,
            severity: model.severity.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateThresholdRequest {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// INFO, WARNING, HIGH or CRITICAL.
    pub severity: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertListQuery {
    pub severity: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn parse_severity(raw: &str) -> Result<Severity, ServiceError> {
    match raw.to_ascii_uppercase().as_str() {
        "INFO" => Ok(Severity::Info),
        "WARNING" => Ok(Severity::Warning),
        "HIGH" => Ok(Severity::High),
        "CRITICAL" => Ok(Severity::Critical),
        other => Err(ServiceError::InvalidInput(format!(
            "Unknown severity: {other}"
        ))),
    }
}

/// Alert history
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    summary = "List alerts",
    description = "Alert history, newest first, optionally filtered by severity",
    params(
        ("severity" = Option<String>, Query, description = "Filter by severity (INFO, WARNING, HIGH, CRITICAL)"),
        ("limit" = Option<u64>, Query, description = "Rows to return (default: 100, max: 1000)"),
        ("offset" = Option<u64>, Query, description = "Rows to skip (default: 0)"),
    ),
    responses(
        (status = 200, description = "Alerts retrieved successfully", body = ApiResponse<Vec<AlertResponse>>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertListQuery>,
) -> Result<Json<ApiResponse<Vec<AlertResponse>>>, ServiceError> {
    let severity = query.severity.as_deref().map(parse_severity).transpose()?;
    let limit = bounded_limit(query.limit)?;
    let offset = query.offset.unwrap_or(0);
    let alerts = state.services.alerts.list(severity, limit, offset).await?;
    Ok(Json(ApiResponse::success(
        alerts.into_iter().map(AlertResponse::from).collect(),
    )))
}

/// Open alerts
#[utoipa::path(
    get,
    path = "/api/v1/alerts/active",
    summary = "List active alerts",
    description = "All unresolved alerts, newest first",
    responses(
        (status = 200, description = "Active alerts retrieved successfully", body = ApiResponse<Vec<AlertResponse>>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn active_alerts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<AlertResponse>>>, ServiceError> {
    let alerts = state.services.alerts.active().await?;
    Ok(Json(ApiResponse::success(
        alerts.into_iter().map(AlertResponse::from).collect(),
    )))
}

/// Resolve an alert
#[utoipa::path(
    post,
    path = "/api/v1/alerts/{alert_id}/resolve",
    summary = "Resolve alert",
    description = "Marks an open alert as resolved",
    params(
        ("alert_id" = i64, Path, description = "Alert id"),
    ),
    responses(
        (status = 200, description = "Alert resolved successfully", body = ApiResponse<AlertResponse>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Alert already resolved", body = crate::errors::ErrorResponse),
        (status = 404, description = "Alert not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> Result<Json<ApiResponse<AlertResponse>>, ServiceError> {
    let alert = state.services.alerts.resolve(alert_id).await?;
    Ok(Json(ApiResponse::success(AlertResponse::from(alert))))
}

/// Threshold configuration list
#[utoipa::path(
    get,
    path = "/api/v1/alerts/thresholds",
    summary = "List thresholds",
    description = "All per-point threshold configurations",
    responses(
        (status = 200, description = "Thresholds retrieved successfully", body = ApiResponse<Vec<ThresholdConfigResponse>>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_thresholds(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ThresholdConfigResponse>>>, ServiceError> {
    let configs = state.services.alerts.list_thresholds().await?;
    Ok(Json(ApiResponse::success(
        configs
            .into_iter()
            .map(ThresholdConfigResponse::from)
            .collect(),
    )))
}

/// Upsert a point's threshold configuration
#[utoipa::path(
    put,
    path = "/api/v1/alerts/thresholds/{point_id}",
    summary = "Upsert threshold",
    description = "Creates or updates the threshold bounds and severity for a point",
    params(
        ("point_id" = String, Path, description = "Point identifier"),
    ),
    request_body = UpdateThresholdRequest,
    responses(
        (status = 200, description = "Threshold saved successfully", body = ApiResponse<ThresholdConfigResponse>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid bounds or severity", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_threshold(
    State(state): State<AppState>,
    Path(point_id): Path<String>,
    Json(request): Json<UpdateThresholdRequest>,
) -> Result<Json<ApiResponse<ThresholdConfigResponse>>, ServiceError> {
    let severity = request.severity.as_deref().map(parse_severity).transpose()?;
    let update = ThresholdUpdate {
        min_value: request.min_value,
        max_value: request.max_value,
        severity,
    };
    let saved = state
        .services
        .alerts
        .upsert_threshold(&point_id, update)
        .await?;
    Ok(Json(ApiResponse::success(ThresholdConfigResponse::from(
        saved,
    ))))
}
