use crate::{
    db::DbPool,
    entities::alert::{self, Entity as AlertEntity},
    entities::threshold_config::{self, Entity as ThresholdConfigEntity},
    entities::Severity,
    errors::ServiceError,
    identity::device_identity,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Partial update for a point's threshold bounds. Absent fields keep
/// their stored values.
#[derive(Debug, Clone, Default)]
pub struct ThresholdUpdate {
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub severity: Option<Severity>,
}

/// Alert queries, resolution, and threshold configuration.
#[derive(Clone)]
pub struct AlertService {
    db_pool: Arc<DbPool>,
}

impl AlertService {
    /// Creates a new alert service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Alert history page, newest first, optionally filtered by severity.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        severity: Option<Severity>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<alert::Model>, ServiceError> {
        let db = &*self.db_pool;

        let mut query = AlertEntity::find();
        if let Some(severity) = severity {
            query = query.filter(alert::Column::Severity.eq(severity));
        }
        query
            .order_by_desc(alert::Column::CreatedAt)
            .limit(limit)
            .offset(offset)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list alerts");
                ServiceError::DatabaseError(e)
            })
    }

    /// All unresolved alerts, newest first.
    #[instrument(skip(self))]
    pub async fn active(&self) -> Result<Vec<alert::Model>, ServiceError> {
        let db = &*self.db_pool;

        AlertEntity::find()
            .filter(alert::Column::ResolvedAt.is_null())
            .order_by_desc(alert::Column::CreatedAt)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to list active alerts");
                ServiceError::DatabaseError(e)
            })
    }

    /// Marks an alert resolved. Resolving twice is an error so callers
    /// notice stale alert ids.
    #[instrument(skip(self))]
    pub async fn resolve(&self, alert_id: i64) -> Result<alert::Model, ServiceError> {
        let db = &*self.db_pool;

        let alert = AlertEntity::find_by_id(alert_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, alert_id, "Failed to fetch alert");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| ServiceError::NotFound(format!("Alert {alert_id} not found")))?;

        if alert.resolved_at.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "Alert {alert_id} is already resolved"
            )));
        }

        let mut active: alert::ActiveModel = alert.into();
        active.resolved_at = Set(Some(Utc::now()));
        let updated = active.update(db).await.map_err(|e| {
            error!(error = %e, alert_id, "Failed to resolve alert");
            ServiceError::DatabaseError(e)
        })?;

        info!(alert_id, "Alert resolved");
        Ok(updated)
    }

    /// All per-point threshold configurations.
    #[instrument(skip(self))]
    pub async fn list_thresholds(&self) -> Result<Vec<threshold_config::Model>, ServiceError> {
        let db = &*self.db_pool;

        ThresholdConfigEntity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to list threshold configs");
            ServiceError::DatabaseError(e)
        })
    }

    /// Creates or updates the threshold row for a point. Fields absent
    /// from the update keep their stored values; a new row starts from
    /// the increment metric with WARNING severity.
    #[instrument(skip(self))]
    pub async fn upsert_threshold(
        &self,
        point_id: &str,
        update: ThresholdUpdate,
    ) -> Result<threshold_config::Model, ServiceError> {
        let db = &*self.db_pool;

        let existing = ThresholdConfigEntity::find()
            .filter(threshold_config::Column::PointId.eq(point_id))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, point_id, "Failed to fetch threshold config");
                ServiceError::DatabaseError(e)
            })?;

        let merged_min = update
            .min_value
            .or_else(|| existing.as_ref().and_then(|c| c.min_value));
        let merged_max = update
            .max_value
            .or_else(|| existing.as_ref().and_then(|c| c.max_value));
        if let (Some(min), Some(max)) = (merged_min, merged_max) {
            if min >= max {
                return Err(ServiceError::ValidationError(format!(
                    "min_value {min} must be below max_value {max}"
                )));
            }
        }

        let saved = match existing {
            Some(config) => {
                let mut active: threshold_config::ActiveModel = config.into();
                if update.min_value.is_some() {
                    active.min_value = Set(update.min_value);
                }
                if update.max_value.is_some() {
                    active.max_value = Set(update.max_value);
                }
                if let Some(severity) = update.severity {
                    active.severity = Set(severity);
                }
                active.update(db).await
            }
            None => {
                let active = threshold_config::ActiveModel {
                    point_id: Set(Some(point_id.to_string())),
                    device_id: Set(Some(device_identity(point_id))),
                    metric: Set("incr".to_string()),
                    min_value: Set(update.min_value),
                    max_value: Set(update.max_value),
                    severity: Set(update.severity.unwrap_or(Severity::Warning)),
                    ..Default::default()
                };
                active.insert(db).await
            }
        }
        .map_err(|e| {
            error!(error = %e, point_id, "Failed to save threshold config");
            ServiceError::DatabaseError(e)
        })?;

        info!(point_id, "Threshold config saved");
        Ok(saved)
    }
}
