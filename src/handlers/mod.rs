pub mod alerts;
pub mod devices;
pub mod health;
pub mod readings;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::services::{AlertService, DeviceService, ReadingService};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Default page size for list endpoints.
pub(crate) const DEFAULT_LIMIT: u64 = 100;
/// Upper bound on any requested page size.
pub(crate) const MAX_LIMIT: u64 = 1000;

/// Services layer that encapsulates the queries used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub readings: Arc<ReadingService>,
    pub devices: Arc<DeviceService>,
    pub alerts: Arc<AlertService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            readings: Arc::new(ReadingService::new(db_pool.clone())),
            devices: Arc::new(DeviceService::new(db_pool.clone())),
            alerts: Arc::new(AlertService::new(db_pool)),
        }
    }
}

/// Applies the default and the cap to a requested page size.
pub(crate) fn bounded_limit(requested: Option<u64>) -> Result<u64, ServiceError> {
    let limit = requested.unwrap_or(DEFAULT_LIMIT);
    if limit > MAX_LIMIT {
        return Err(ServiceError::InvalidInput(format!(
            "limit must not exceed {MAX_LIMIT}"
        )));
    }
    Ok(limit)
}
