use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

/// Wire shape of every error the API returns.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Device 998089243624684578 not found",
    "details": null,
    "request_id": "9f2c1e7a",
    "timestamp": "2025-01-15T08:00:00.000Z"
}))]
pub struct ErrorResponse {
    /// Canonical reason for the HTTP status, e.g. "Bad Request"
    #[schema(example = "Not Found")]
    pub error: String,
    /// What went wrong, phrased for the caller
    #[schema(example = "Device 998089243624684578 not found")]
    pub message: String,
    /// Field-level context when there is any
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "min_value 200 must be below max_value 80")]
    pub details: Option<String>,
    /// Correlates with the x-request-id response header
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "9f2c1e7a")]
    pub request_id: Option<String>,
    /// RFC 3339 moment the error was produced
    #[schema(example = "2025-01-15T08:00:00.000Z")]
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Internal server error")]
    InternalServerError,

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Most of the crate names its error type `AppError`; they are the same enum.
pub type AppError = ServiceError;

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Single place that decides which HTTP status each variant maps to.
    pub fn status_code(&self) -> StatusCode {
        use StatusCode as S;
        match self {
            Self::NotFound(_) => S::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidInput(_)
            | Self::InvalidOperation(_)
            | Self::BadRequest(_) => S::BAD_REQUEST,
            Self::Conflict(_) => S::CONFLICT,
            Self::ExternalServiceError(_) => S::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => S::SERVICE_UNAVAILABLE,
            Self::DatabaseError(_)
            | Self::InternalError(_)
            | Self::InternalServerError
            | Self::MigrationError(_)
            | Self::Other(_) => S::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Server-side failures collapse to a
    /// generic phrase so driver and schema detail stays out of responses.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_)
            | Self::InternalServerError
            | Self::MigrationError(_)
            | Self::Other(_) => "Internal server error".to_string(),
            Self::ServiceUnavailable(msg) => format!("Service unavailable: {}", msg),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: None,
            request_id: crate::middleware::current_request_id()
                .map(|rid| rid.as_str().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        (status, Json(body)).into_response()
    }
}
