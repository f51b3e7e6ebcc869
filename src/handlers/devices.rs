use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::bounded_limit;
use crate::entities::device;
use crate::handlers::readings::{ReadingResponse, RealtimeQuery};
use crate::{errors::ServiceError, ApiResponse, AppState};

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    pub device_id: i64,
    pub device_no: Option<String>,
    pub device_name: Option<String>,
    pub status: i32,
    pub remark: Option<String>,
}

impl From<device::Model> for DeviceResponse {
    fn from(model: device::Model) -> Self {
        Self {
            device_id: model.device_id,
            device_no: model.device_no,
            device_name: model.device_name,
            status: model.status,
            remark: model.remark,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceListQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// List registered devices
#[utoipa::path(
    get,
    path = "/api/v1/devices",
    summary = "List devices",
    description = "Device registry page, ordered by device id",
    params(
        ("limit" = Option<u64>, Query, description = "Rows to return (default: 100, max: 1000)"),
        ("offset" = Option<u64>, Query, description = "Rows to skip (default: 0)"),
    ),
    responses(
        (status = 200, description = "Devices retrieved successfully", body = ApiResponse<Vec<DeviceResponse>>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> Result<Json<ApiResponse<Vec<DeviceResponse>>>, ServiceError> {
    let limit = bounded_limit(query.limit)?;
    let offset = query.offset.unwrap_or(0);
    let devices = state.services.devices.list(limit, offset).await?;
    Ok(Json(ApiResponse::success(
        devices.into_iter().map(DeviceResponse::from).collect(),
    )))
}

/// Fetch one device
#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}",
    summary = "Get device",
    description = "Single device by its numeric identity",
    params(
        ("device_id" = i64, Path, description = "Device identity"),
    ),
    responses(
        (status = 200, description = "Device retrieved successfully", body = ApiResponse<DeviceResponse>,
            headers(("x-request-id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Device not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
) -> Result<Json<ApiResponse<DeviceResponse>>, ServiceError> {
    let device = state.services.devices.get(device_id).await?;
    Ok(Json(ApiResponse::success(DeviceResponse::from(device))))
}

/// Recent readings for one device
#[utoipa::path(
    get,
    path = "/api/v1/devices/{device_id}/readings",
    summary = "Device readings",
    description = "Recent readings for one device, newest first",
    params(
        ("device_id" = i64, Path, description = "Device identity"),
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
pub async fn device_readings(
    State(state): State<AppState>,
    Path(device_id): Path<i64>,
    Query(query): Query<RealtimeQuery>,
) -> Result<Json<ApiResponse<Vec<ReadingResponse>>>, ServiceError> {
    let limit = bounded_limit(query.limit)?;
    let readings = state
        .services
        .readings
        .device_readings(device_id, limit)
        .await?;
    Ok(Json(ApiResponse::success(
        readings.into_iter().map(ReadingResponse::from).collect(),
    )))
}
