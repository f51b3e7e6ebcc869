use crate::{
    db::DbPool,
    entities::alert::{self, Entity as AlertEntity},
    entities::meter_reading::{self, Entity as MeterReadingEntity},
    errors::ServiceError,
    services::simulator::{floor_hour, SimulatorService},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Startup housekeeping: alert retention and historical gap repair.
#[derive(Clone)]
pub struct MaintenanceService {
    db_pool: Arc<DbPool>,
    simulator: SimulatorService,
}

impl MaintenanceService {
    /// Creates a new maintenance service instance
    pub fn new(db_pool: Arc<DbPool>, simulator: SimulatorService) -> Self {
        Self { db_pool, simulator }
    }

    /// Deletes alerts older than the retention window. Readings and
    /// profiles are never touched. Returns the number of rows removed.
    #[instrument(skip(self))]
    pub async fn cleanup_expired_alerts(&self, retention_days: u32) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;
        let cutoff = Utc::now() - Duration::days(i64::from(retention_days));

        let result = AlertEntity::delete_many()
            .filter(alert::Column::CreatedAt.lt(cutoff))
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete expired alerts");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected > 0 {
            info!(
                removed = result.rows_affected,
                retention_days, "Expired alerts removed"
            );
        }
        Ok(result.rows_affected)
    }

    /// Regenerates readings for every hour in the lookback window that has
    /// no data at all, oldest first. The current hour is left to the live
    /// cycle. Hours must be filled in increasing order because each tick
    /// compounds on the profile's running total.
    #[instrument(skip(self))]
    pub async fn backfill_missing_data(&self, window_days: u32) -> Result<u64, ServiceError> {
        let db = &*self.db_pool;

        let current_hour = floor_hour(Utc::now());
        let window_start = current_hour - Duration::days(i64::from(window_days));

        let present: HashSet<DateTime<Utc>> = MeterReadingEntity::find()
            .select_only()
            .column(meter_reading::Column::Time)
            .distinct()
            .filter(meter_reading::Column::Time.gt(window_start))
            .filter(meter_reading::Column::Time.lt(current_hour))
            .into_tuple::<DateTime<Utc>>()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list recorded hours");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .collect();

        let mut backfilled = 0u64;
        let mut cursor = window_start + Duration::hours(1);
        while cursor < current_hour {
            if !present.contains(&cursor) {
                self.simulator.generate(Some(cursor)).await?;
                backfilled += 1;
            }
            cursor = cursor + Duration::hours(1);
        }

        if backfilled > 0 {
            info!(hours = backfilled, window_days, "Backfilled missing hours");
        }
        Ok(backfilled)
    }
}
