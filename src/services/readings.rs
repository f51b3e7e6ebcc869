use crate::{
    db::DbPool,
    entities::meter_reading::{self, Entity as MeterReadingEntity},
    errors::ServiceError,
    services::simulator::round2,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, instrument};
use utoipa::ToSchema;

/// Reporting window for consumption statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsPeriod {
    Day,
    Week,
    Month,
}

impl StatsPeriod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

/// Aggregated consumption over a reporting window. The average is
/// taken over the full window, not just hours with data.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UsageStatistics {
    pub period: String,
    pub total_consumption: f64,
    pub avg_hourly: f64,
    /// Hour of day (0-23) with the highest summed increment, if any data.
    pub peak_hour: Option<u32>,
    pub peak_value: Option<f64>,
}

/// Read-side queries over stored readings.
#[derive(Clone)]
pub struct ReadingService {
    db_pool: Arc<DbPool>,
}

impl ReadingService {
    /// Creates a new reading query service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Latest readings across all points, newest first.
    #[instrument(skip(self))]
    pub async fn realtime(&self, limit: u64) -> Result<Vec<meter_reading::Model>, ServiceError> {
        let db = &*self.db_pool;

        MeterReadingEntity::find()
            .order_by_desc(meter_reading::Column::Time)
            .limit(limit)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch realtime readings");
                ServiceError::DatabaseError(e)
            })
    }

    /// Recent readings for one device, newest first.
    #[instrument(skip(self))]
    pub async fn device_readings(
        &self,
        device_id: i64,
        limit: u64,
    ) -> Result<Vec<meter_reading::Model>, ServiceError> {
        let db = &*self.db_pool;

        MeterReadingEntity::find()
            .filter(meter_reading::Column::DeviceId.eq(device_id))
            .order_by_desc(meter_reading::Column::Time)
            .limit(limit)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch device readings");
                ServiceError::DatabaseError(e)
            })
    }

    /// Consumption summary over the requested window: total increment,
    /// hourly average, and the hour of day with the highest total.
    #[instrument(skip(self))]
    pub async fn statistics(&self, period: StatsPeriod) -> Result<UsageStatistics, ServiceError> {
        let db = &*self.db_pool;
        let start = Utc::now() - Duration::days(period.days());

        let rows: Vec<(DateTime<Utc>, f64)> = MeterReadingEntity::find()
            .select_only()
            .column(meter_reading::Column::Time)
            .column(meter_reading::Column::Incr)
            .filter(meter_reading::Column::Time.gte(start))
            .into_tuple()
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch readings for statistics");
                ServiceError::DatabaseError(e)
            })?;

        let total: f64 = rows.iter().map(|(_, incr)| incr).sum();
        let hours = (period.days() * 24) as f64;
        let avg_hourly = if hours > 0.0 { total / hours } else { 0.0 };

        let mut by_hour = [0.0_f64; 24];
        let mut seen = [false; 24];
        for (time, incr) in &rows {
            let hour = time.hour() as usize;
            by_hour[hour] += incr;
            seen[hour] = true;
        }
        let peak_hour = (0..24_usize)
            .filter(|&h| seen[h])
            .max_by(|&a, &b| by_hour[a].total_cmp(&by_hour[b]));

        Ok(UsageStatistics {
            period: period.as_str().to_string(),
            total_consumption: round2(total),
            avg_hourly: round2(avg_hourly),
            peak_hour: peak_hour.map(|h| h as u32),
            peak_value: peak_hour.map(|h| round2(by_hour[h])),
        })
    }
}
