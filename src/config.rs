use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://gridpulse.db?mode=rwc";

const CONFIG_DIR: &str = "config";
const DEFAULT_ENV: &str = "development";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_ANOMALY_RATE: f64 = 0.03;
const DEFAULT_BACKFILL_DAYS: u32 = 30;
const DEFAULT_RETENTION_DAYS: u32 = 30;
const DEFAULT_NOTIFIER_CHANNEL: &str = "none";

/// Simulation and maintenance tuning.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Probability that a generated increment is an injected anomaly
    #[serde(default = "default_anomaly_rate")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub anomaly_rate: f64,

    /// How many days back the startup backfill scans for missing hours
    #[serde(default = "default_backfill_days")]
    #[validate(range(min = 1))]
    pub backfill_days: u32,

    /// Alerts older than this many days are deleted by cleanup
    #[serde(default = "default_retention_days")]
    #[validate(range(min = 1))]
    pub retention_days: u32,

    /// Arm the hourly generate+detect trigger
    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            anomaly_rate: default_anomaly_rate(),
            backfill_days: default_backfill_days(),
            retention_days: default_retention_days(),
            scheduler_enabled: true,
        }
    }
}

/// Alert delivery channel selection.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    /// One of "none", "feishu", "sms"
    #[serde(default = "default_notifier_channel")]
    #[validate(custom = "validate_notifier_channel")]
    pub channel: String,

    /// Feishu bot webhook, required when channel = "feishu"
    #[serde(default)]
    pub feishu_webhook_url: Option<String>,

    /// Comma-separated recipient numbers, required when channel = "sms"
    #[serde(default)]
    pub sms_recipients: Option<String>,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            channel: default_notifier_channel(),
            feishu_webhook_url: None,
            sms_recipients: None,
        }
    }
}

/// The full application configuration, assembled by [`load_config`] and
/// validated before anything else starts.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// sea-orm connection URL, sqlite or postgres
    pub database_url: String,

    /// HTTP bind address
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Profile name, "development" loosens the CORS requirement
    pub environment: String,

    /// Default tracing level for this crate
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Emit log lines as JSON instead of plain text
    #[serde(default)]
    pub log_json: bool,

    /// Apply embedded migrations before serving
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated allowed origins; unset means permissive in
    /// development and a startup error elsewhere
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Opt into permissive CORS outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    // Pool tuning, consumed by db::DbConfig.
    #[serde(default = "default_max_connections")]
    pub db_max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub db_min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default)]
    #[validate]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    #[validate]
    pub notifier: NotifierConfig,
}

impl AppConfig {
    /// A config with the given essentials and everything else defaulted.
    /// Test harnesses build their state through this.
    pub fn new(database_url: String, host: String, port: u16, environment: String) -> Self {
        Self {
            database_url,
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            db_max_connections: default_max_connections(),
            db_min_connections: default_min_connections(),
            db_connect_timeout_secs: default_connect_timeout_secs(),
            db_idle_timeout_secs: default_idle_timeout_secs(),
            db_acquire_timeout_secs: default_acquire_timeout_secs(),
            simulator: SimulatorConfig::default(),
            notifier: NotifierConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_deref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Cross-field rules the derive-level validators cannot express.
    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.should_allow_permissive_cors() && !self.has_cors_allowed_origins() {
            let mut err = ValidationError::new("cors_allowed_origins_required");
            err.message = Some(
                "Outside development, set APP__CORS_ALLOWED_ORIGINS or opt in with APP__CORS_ALLOW_ANY_ORIGIN=true".into(),
            );
            errors.add("cors_allowed_origins", err);
        }

        if self.notifier.channel.eq_ignore_ascii_case("feishu")
            && self
                .notifier
                .feishu_webhook_url
                .as_deref()
                .map(|url| url.trim().is_empty())
                .unwrap_or(true)
        {
            let mut err = ValidationError::new("feishu_webhook_url_required");
            err.message = Some(
                "Set APP__NOTIFIER__FEISHU_WEBHOOK_URL when the feishu channel is selected".into(),
            );
            errors.add("notifier", err);
        }

        if self.notifier.channel.eq_ignore_ascii_case("sms")
            && !self
                .notifier
                .sms_recipients
                .as_deref()
                .map(|raw| raw.split(',').any(|r| !r.trim().is_empty()))
                .unwrap_or(false)
        {
            let mut err = ValidationError::new("sms_recipients_required");
            err.message =
                Some("Set APP__NOTIFIER__SMS_RECIPIENTS when the sms channel is selected".into());
            errors.add("notifier", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_anomaly_rate() -> f64 {
    DEFAULT_ANOMALY_RATE
}

fn default_backfill_days() -> u32 {
    DEFAULT_BACKFILL_DAYS
}

fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}

fn default_notifier_channel() -> String {
    DEFAULT_NOTIFIER_CHANNEL.to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    600
}

fn default_acquire_timeout_secs() -> u64 {
    8
}

fn default_true() -> bool {
    true
}

fn validate_notifier_channel(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "none" | "feishu" | "sms" => Ok(()),
        _ => {
            let mut err = ValidationError::new("notifier_channel");
            err.message = Some("Must be one of: none, feishu, sms".into());
            Err(err)
        }
    }
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => {
            let mut err = ValidationError::new("log_level");
            err.message = Some("Must be one of: trace, debug, info, warn, error".into());
            Err(err)
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the
/// directive derived from the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("gridpulse_api={},tower_http=info", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads and validates configuration from, in override order: built-in
/// defaults, `config/default.toml`, `config/{RUN_ENV}.toml`, then `APP__*`
/// environment variables with `__` as the nesting separator.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // RUN_ENV and APP_ENV both select the profile file.
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .set_default("simulator.anomaly_rate", DEFAULT_ANOMALY_RATE)?
        .set_default("simulator.backfill_days", i64::from(DEFAULT_BACKFILL_DAYS))?
        .set_default(
            "simulator.retention_days",
            i64::from(DEFAULT_RETENTION_DAYS),
        )?
        .set_default("simulator.scheduler_enabled", true)?
        .set_default("notifier.channel", DEFAULT_NOTIFIER_CHANNEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;
    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
