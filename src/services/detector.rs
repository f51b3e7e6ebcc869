use crate::{
    db::DbPool,
    entities::alert::{self, Entity as AlertEntity},
    entities::device_profile::Entity as DeviceProfileEntity,
    entities::meter_reading::{self, Entity as MeterReadingEntity},
    entities::threshold_config::Entity as ThresholdConfigEntity,
    entities::AlertKind,
    errors::ServiceError,
    identity::device_identity,
    rules::{self, RuleHit},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// How long a point may stay silent before it counts as offline.
const OFFLINE_GRACE_HOURS: i64 = 2;

/// Evaluates the three anomaly passes and persists the resulting alerts.
#[derive(Clone)]
pub struct DetectorService {
    db_pool: Arc<DbPool>,
}

impl DetectorService {
    /// Creates a new detector service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Runs the threshold, trend and offline passes in order. Each pass
    /// commits its own alerts; the return value contains only the alerts
    /// created by this call.
    #[instrument(skip(self))]
    pub async fn detect_all(&self) -> Result<Vec<alert::Model>, ServiceError> {
        let now = Utc::now();

        let mut alerts = self.check_thresholds().await?;
        alerts.extend(self.check_trends(now).await?);
        alerts.extend(self.check_offline(now).await?);

        if !alerts.is_empty() {
            info!(count = alerts.len(), "Detection cycle raised alerts");
        }
        Ok(alerts)
    }

    /// Threshold pass: each configured point's most recent increment is
    /// checked against its static bounds. Rows without a point mapping
    /// predate point-keyed configuration and are skipped.
    async fn check_thresholds(&self) -> Result<Vec<alert::Model>, ServiceError> {
        let db = &*self.db_pool;

        let configs = ThresholdConfigEntity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to load threshold configs");
            ServiceError::DatabaseError(e)
        })?;

        let mut created = Vec::new();
        for config in configs {
            let Some(point_id) = config.point_id.as_deref() else {
                continue;
            };

            let reading = MeterReadingEntity::find()
                .filter(meter_reading::Column::PointId.eq(point_id))
                .order_by_desc(meter_reading::Column::Time)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, point_id = %point_id, "Failed to fetch latest reading");
                    ServiceError::DatabaseError(e)
                })?;
            let Some(reading) = reading else {
                continue;
            };

            if let Some(hit) = rules::check_threshold(
                point_id,
                reading.incr,
                config.min_value,
                config.max_value,
                config.severity,
            ) {
                created
                    .push(self.insert_alert(point_id, reading.device_id, hit).await?);
            }
        }
        Ok(created)
    }

    /// Trend pass: the freshest reading of the last hour against the
    /// freshest reading in the same hour yesterday, the half-open window
    /// [now - 25h, now - 24h). Points missing either side are skipped.
    async fn check_trends(&self, now: DateTime<Utc>) -> Result<Vec<alert::Model>, ServiceError> {
        let db = &*self.db_pool;

        let profiles = DeviceProfileEntity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to load device profiles");
            ServiceError::DatabaseError(e)
        })?;

        let mut created = Vec::new();
        for profile in profiles {
            let point_id = profile.point_id.as_str();

            let current = MeterReadingEntity::find()
                .filter(meter_reading::Column::PointId.eq(point_id))
                .filter(meter_reading::Column::Time.gte(now - Duration::hours(1)))
                .order_by_desc(meter_reading::Column::Time)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, point_id = %point_id, "Failed to fetch current reading");
                    ServiceError::DatabaseError(e)
                })?;
            let Some(current) = current else {
                continue;
            };

            let previous = MeterReadingEntity::find()
                .filter(meter_reading::Column::PointId.eq(point_id))
                .filter(meter_reading::Column::Time.gte(now - Duration::hours(25)))
                .filter(meter_reading::Column::Time.lt(now - Duration::hours(24)))
                .order_by_desc(meter_reading::Column::Time)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, point_id = %point_id, "Failed to fetch reference reading");
                    ServiceError::DatabaseError(e)
                })?;
            let Some(previous) = previous else {
                continue;
            };

            if let Some(hit) = rules::check_trend(point_id, current.incr, previous.incr) {
                created
                    .push(self.insert_alert(point_id, current.device_id, hit).await?);
            }
        }
        Ok(created)
    }

    /// Offline pass: points whose newest reading is older than the grace
    /// window get one OFFLINE alert, held open until resolved. An already
    /// open OFFLINE alert suppresses a second one.
    async fn check_offline(&self, now: DateTime<Utc>) -> Result<Vec<alert::Model>, ServiceError> {
        let db = &*self.db_pool;
        let cutoff = now - Duration::hours(OFFLINE_GRACE_HOURS);

        let last_seen: Vec<(String, DateTime<Utc>)> = MeterReadingEntity::find()
            .select_only()
            .column(meter_reading::Column::PointId)
            .column_as(meter_reading::Column::Time.max(), "last_seen")
            .group_by(meter_reading::Column::PointId)
            .into_tuple()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to compute last-seen times");
                ServiceError::DatabaseError(e)
            })?;

        let mut created = Vec::new();
        for (point_id, seen) in last_seen {
            if seen >= cutoff {
                continue;
            }

            let open = AlertEntity::find()
                .filter(alert::Column::PointId.eq(point_id.as_str()))
                .filter(alert::Column::AlertType.eq(AlertKind::Offline))
                .filter(alert::Column::ResolvedAt.is_null())
                .count(db)
                .await
                .map_err(|e| {
                    error!(error = %e, point_id = %point_id, "Failed to check for open offline alert");
                    ServiceError::DatabaseError(e)
                })?;
            if open > 0 {
                continue;
            }

            let hit = RuleHit {
                kind: AlertKind::Offline,
                severity: crate::entities::Severity::High,
                message: format!(
                    "point {point_id} no data reported for over 2 hours (last seen {})",
                    seen.format("%Y-%m-%d %H:%M")
                ),
                observed: None,
                threshold: None,
            };
            let device_id = device_identity(&point_id);
            created.push(self.insert_alert(&point_id, device_id, hit).await?);
        }
        Ok(created)
    }

    async fn insert_alert(
        &self,
        point_id: &str,
        device_id: i64,
        hit: RuleHit,
    ) -> Result<alert::Model, ServiceError> {
        let db = &*self.db_pool;

        let model = alert::ActiveModel {
            point_id: Set(Some(point_id.to_string())),
            device_id: Set(Some(device_id)),
            alert_type: Set(hit.kind),
            severity: Set(hit.severity),
            message: Set(hit.message),
            value: Set(hit.observed),
            threshold: Set(hit.threshold),
            created_at: Set(Utc::now()),
            resolved_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| {
            error!(error = %e, point_id = %point_id, "Failed to persist alert");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            alert_id = model.id,
            point_id = %point_id,
            kind = %model.alert_type,
            severity = %model.severity,
            "Alert created"
        );
        Ok(model)
    }
}
