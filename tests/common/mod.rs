use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tower::ServiceExt;

use gridpulse_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{alert, device, device_profile, meter_reading, threshold_config},
    entities::{AlertKind, Severity},
    identity::device_identity,
    middleware::request_id_middleware,
    AppState,
};

/// Helper harness spinning up an application state backed by an in-memory
/// SQLite database. A pool of exactly one connection keeps every query on
/// the same `sqlite::memory:` instance.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            db_cfg.url.clone(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );

        let state = AppState::new(Arc::new(pool), cfg);
        let router = Router::new()
            .nest("/api/v1", gridpulse_api::api_v1_routes())
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        Self { router, state }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a request with extra headers attached.
    #[allow(dead_code)]
    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Insert a simulation profile for a point.
    #[allow(dead_code)]
    pub async fn seed_profile(
        &self,
        point_id: &str,
        mean: f64,
        std: f64,
        last_value: f64,
    ) -> device_profile::Model {
        device_profile::ActiveModel {
            point_id: Set(point_id.to_string()),
            mean_value: Set(mean),
            std_value: Set(std),
            min_value: Set(Some(0.0)),
            max_value: Set(Some(mean * 4.0)),
            last_value: Set(last_value),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed device profile")
    }

    /// Insert a registry row for a point. Returns the derived device id.
    #[allow(dead_code)]
    pub async fn seed_device(&self, point_id: &str, name: &str) -> i64 {
        let device_id = device_identity(point_id);
        device::ActiveModel {
            device_id: Set(device_id),
            device_no: Set(Some(point_id.to_string())),
            device_name: Set(Some(name.to_string())),
            status: Set(1),
            remark: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed device");
        device_id
    }

    /// Insert one meter reading.
    #[allow(dead_code)]
    pub async fn seed_reading(
        &self,
        point_id: &str,
        time: DateTime<Utc>,
        value: f64,
        incr: f64,
    ) -> meter_reading::Model {
        meter_reading::ActiveModel {
            time: Set(time),
            point_id: Set(point_id.to_string()),
            device_id: Set(device_identity(point_id)),
            value: Set(value),
            incr: Set(incr),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed meter reading")
    }

    /// Insert a threshold config for a point.
    #[allow(dead_code)]
    pub async fn seed_threshold(
        &self,
        point_id: &str,
        min_value: Option<f64>,
        max_value: Option<f64>,
        severity: Severity,
    ) -> threshold_config::Model {
        threshold_config::ActiveModel {
            point_id: Set(Some(point_id.to_string())),
            device_id: Set(Some(device_identity(point_id))),
            metric: Set("incr".to_string()),
            min_value: Set(min_value),
            max_value: Set(max_value),
            severity: Set(severity),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed threshold config")
    }

    /// Insert an alert row directly, bypassing the detector.
    #[allow(dead_code)]
    pub async fn seed_alert(
        &self,
        point_id: &str,
        kind: AlertKind,
        severity: Severity,
        created_at: DateTime<Utc>,
        resolved_at: Option<DateTime<Utc>>,
    ) -> alert::Model {
        alert::ActiveModel {
            point_id: Set(Some(point_id.to_string())),
            device_id: Set(Some(device_identity(point_id))),
            alert_type: Set(kind),
            severity: Set(severity),
            message: Set(format!("seeded {} alert for {}", kind.as_str(), point_id)),
            value: Set(None),
            threshold: Set(None),
            created_at: Set(created_at),
            resolved_at: Set(resolved_at),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed alert")
    }
}
