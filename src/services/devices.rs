use crate::{
    db::DbPool,
    entities::device::{self, Entity as DeviceEntity},
    errors::ServiceError,
};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use std::sync::Arc;
use tracing::{error, instrument};

/// Read-side queries over the device registry.
#[derive(Clone)]
pub struct DeviceService {
    db_pool: Arc<DbPool>,
}

impl DeviceService {
    /// Creates a new device query service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Registry page, ordered by device id for stable pagination.
    #[instrument(skip(self))]
    pub async fn list(&self, limit: u64, offset: u64) -> Result<Vec<device::Model>, ServiceError> {
        let db = &*self.db_pool;

        DeviceEntity::find()
            .order_by_asc(device::Column::DeviceId)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list devices");
                ServiceError::DatabaseError(e)
            })
    }

    /// Single device lookup by its derived numeric identity.
    #[instrument(skip(self))]
    pub async fn get(&self, device_id: i64) -> Result<device::Model, ServiceError> {
        let db = &*self.db_pool;

        DeviceEntity::find_by_id(device_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, device_id, "Failed to fetch device");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Device {device_id} not found")))
    }
}
