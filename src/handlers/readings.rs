use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::bounded_limit;
use crate::entities::meter_reading;
use crate::services::readings::{StatsPeriod, UsageStatistics};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingResponse {
    pub time: DateTime<Utc>,
    pub point_id: String,
    pub device_id: i64,
    pub value: f64,
    pub incr: f64,
}

impl From<meter_reading::Model> for ReadingResponse {
    fn from(model: meter_reading::Model) -> Self {
        Self {
            time: model.time,
            point_id: model.point_id,
            device_id: model.device_id,
            value: model.value,
            incr: model.incr,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RealtimeQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    pub period: Option<String>,
}

/// Latest readings across all points
#[utoipa::path(
    get,
    path = "/api/v1/readings/realtime",
    summary = "Latest readings",
    description = "Most recent readings across all points, newest first",
    params(
        ("limit" = Option<u64>, Query, description = "Rows to return (default: 100, max: 1000)"),
    ),
    responses(
        (status = 200, description = "Readings retrieved successfully", body = ApiResponse<Vec<ReadingResponse>>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn realtime_readings(
    State(state): State<AppState>,
    Query(query): Query<RealtimeQuery>,
) -> Result<Json<ApiResponse<Vec<ReadingResponse>>>, ServiceError> {
    let limit = bounded_limit(query.limit)?;
    let readings = state.services.readings.realtime(limit).await?;
    Ok(Json(ApiResponse::success(
        readings.into_iter().map(ReadingResponse::from).collect(),
    )))
}

/// Consumption statistics over a reporting window
#[utoipa::path(
    get,
    path = "/api/v1/readings/statistics",
    summary = "Consumption statistics",
    description = "Total consumption, hourly average, and peak hour over the requested window",
    params(
        ("period" = Option<String>, Query, description = "Reporting window: day, week or month (default: day)"),
    ),
    responses(
        (status = 200, description = "Statistics computed successfully", body = ApiResponse<UsageStatistics>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn consumption_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<Json<ApiResponse<UsageStatistics>>, ServiceError> {
    let raw = query.period.as_deref().unwrap_or("day");
    let period = StatsPeriod::parse(raw).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "period must be one of day, week or month, got {raw}"
        ))
    })?;
    let stats = state.services.readings.statistics(period).await?;
    Ok(Json(ApiResponse::success(stats)))
}
