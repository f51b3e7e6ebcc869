use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use http::HeaderValue;
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use gridpulse_api as api;
use gridpulse_api::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db_pool = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("Failed running migrations: {}", e);
            e
        })?;
    }
    let db = Arc::new(db_pool);

    let simulator = api::services::SimulatorService::new(db.clone(), cfg.simulator.anomaly_rate);
    let detector = api::services::DetectorService::new(db.clone());
    let maintenance = api::services::MaintenanceService::new(db.clone(), simulator.clone());
    let notifier = api::notifier::from_config(&cfg.notifier);

    let app_state = api::AppState::new(db.clone(), cfg.clone());

    // Housekeeping catches up before the hourly trigger is armed.
    api::scheduler::run_startup_maintenance(&maintenance, &cfg.simulator).await;
    if cfg.simulator.scheduler_enabled {
        let _scheduler = api::scheduler::start_scheduler(simulator, detector, notifier);
    } else {
        info!("Hourly simulation trigger disabled by configuration");
    }

    let app = Router::<api::AppState>::new()
        .route("/", get(|| async { "gridpulse-api up" }))
        .nest("/api/v1", api::api_v1_routes())
        .merge(api::openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&cfg)?)
        .layer(axum::middleware::from_fn(
            api::middleware::request_id_middleware,
        ))
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port).parse()?;
    info!("gridpulse-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Explicit origin list when configured; permissive only in development or
/// under an explicit override. Anything else is a startup error rather than
/// a silently open API.
fn cors_layer(cfg: &AppConfig) -> Result<CorsLayer, String> {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if !origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any));
    }
    if cfg.should_allow_permissive_cors() {
        let reason = if cfg.is_development() {
            "development environment"
        } else {
            "explicit override enabled"
        };
        info!("No explicit CORS origins configured, allowing any ({reason})");
        return Ok(CorsLayer::permissive());
    }
    let hint = "set APP__CORS_ALLOWED_ORIGINS or APP__CORS_ALLOW_ANY_ORIGIN=true";
    error!("Refusing to start without a CORS policy; {hint}");
    Err(format!("Missing CORS configuration: {hint}"))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
