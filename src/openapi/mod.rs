use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "GridPulse API",
        version = "0.3.0",
        description = r#"
# GridPulse Electricity Monitoring API

Simulated per-device electricity readings with anomaly detection.

## Features

- **Realtime Readings**: Latest hourly readings across all metering points
- **Consumption Statistics**: Totals, hourly averages and peak hours per window
- **Device Registry**: Devices derived from point identifiers
- **Alerting**: Threshold, day-over-day trend and offline detection
- **Threshold Configuration**: Per-point bounds and severity

## Pagination

List endpoints accept `limit` (default 100, max 1000) and, where noted,
`offset` query parameters.

## Error Handling

Errors use a consistent shape with appropriate HTTP status codes:

```json
{
  "error": "Not Found",
  "message": "Device 42 not found",
  "request_id": "a1b2c3",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Readings", description = "Reading queries and statistics"),
        (name = "Devices", description = "Device registry endpoints"),
        (name = "Alerts", description = "Alert and threshold endpoints"),
    ),
    paths(
        // Readings
        crate::handlers::readings::realtime_readings,
        crate::handlers::readings::consumption_statistics,

        // Devices
        crate::handlers::devices::list_devices,
        crate::handlers::devices::get_device,
        crate::handlers::devices::device_readings,

        // Alerts
        crate::handlers::alerts::list_alerts,
        crate::handlers::alerts::active_alerts,
        crate::handlers::alerts::resolve_alert,
        crate::handlers::alerts::list_thresholds,
        crate::handlers::alerts::update_threshold,

        // Health intentionally omitted from OpenAPI paths
    ),
    components(
        schemas(
            // Common types
            crate::ApiResponse<serde_json::Value>,

            // Reading types
            crate::handlers::readings::ReadingResponse,
            crate::services::readings::UsageStatistics,

            // Device types
            crate::handlers::devices::DeviceResponse,

            // Alert types
            crate::handlers::alerts::AlertResponse,
            crate::handlers::alerts::ThresholdConfigResponse,
            crate::handlers::alerts::UpdateThresholdRequest,

            // Error types
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
