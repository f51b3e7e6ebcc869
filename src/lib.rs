//! Simulated electricity metering feed with anomaly detection.
//!
//! The library half of gridpulse-api: entities and services for reading
//! generation, detection and maintenance, plus the axum surface that serves
//! them. The binary in `main.rs` wires configuration, scheduling and
//! shutdown around what lives here.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod migrator;
pub mod notifier;
pub mod openapi;
pub mod rules;
pub mod scheduler;
pub mod services;

use axum::{routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Everything a handler can reach: the pool, the loaded config and the
/// query services, cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

/// Envelope every successful endpoint returns.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::middleware::current_request_id()
                .map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

/// All versioned API routes, nested under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Probes
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::readiness))
        // Readings
        .route(
            "/readings/realtime",
            get(handlers::readings::realtime_readings),
        )
        .route(
            "/readings/statistics",
            get(handlers::readings::consumption_statistics),
        )
        // Devices
        .route("/devices", get(handlers::devices::list_devices))
        .route("/devices/{device_id}", get(handlers::devices::get_device))
        .route(
            "/devices/{device_id}/readings",
            get(handlers::devices::device_readings),
        )
        // Alerts
        .route("/alerts", get(handlers::alerts::list_alerts))
        .route("/alerts/active", get(handlers::alerts::active_alerts))
        .route(
            "/alerts/{alert_id}/resolve",
            axum::routing::post(handlers::alerts::resolve_alert),
        )
        .route("/alerts/thresholds", get(handlers::alerts::list_thresholds))
        .route(
            "/alerts/thresholds/{point_id}",
            axum::routing::put(handlers::alerts::update_threshold),
        )
}
