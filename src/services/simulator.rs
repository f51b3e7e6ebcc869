use crate::{
    db::DbPool,
    entities::device_profile::{self, Entity as DeviceProfileEntity},
    entities::meter_reading::{self, Entity as MeterReadingEntity},
    errors::ServiceError,
    identity::device_identity,
};
use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::Normal;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Consumption weighting by hour of day. Overnight hours draw little,
/// the morning ramp and the evening peak draw the most.
pub fn hourly_factor(hour: u32) -> f64 {
    match hour {
        0..=6 => 0.5,
        7..=9 => 1.3,
        10..=17 => 1.0,
        18..=21 => 1.4,
        22..=23 => 0.7,
        _ => 1.0,
    }
}

/// Readings are stored with 2 decimal places.
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Truncates a timestamp to the top of its hour, the tick resolution.
pub fn floor_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    t.duration_trunc(Duration::hours(1)).unwrap_or(t)
}

/// Draws one hourly consumption increment for a profile.
///
/// With probability `anomaly_rate` the increment is an injected anomaly:
/// a spike of 2.5x to 4x the expected draw, or a collapse to 2% to 15% of
/// it, each half of the time. Otherwise the expected draw plus Gaussian
/// noise scaled to the profile's standard deviation, clamped at zero.
pub fn generate_increment<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std: f64,
    hour: u32,
    anomaly_rate: f64,
) -> f64 {
    let base = mean * hourly_factor(hour);
    let incr = if anomaly_rate > 0.0 && rng.gen_bool(anomaly_rate.min(1.0)) {
        if rng.gen_bool(0.5) {
            base * rng.gen_range(2.5..=4.0)
        } else {
            base * rng.gen_range(0.02..=0.15)
        }
    } else if std > 0.0 {
        let noise = Normal::new(0.0, 0.3 * std)
            .map(|dist| rng.sample(dist))
            .unwrap_or(0.0);
        (base + noise).max(0.0)
    } else {
        base.max(0.0)
    };
    round2(incr)
}

/// Produces one synthetic reading per registered point per tick and
/// advances each profile's running total.
#[derive(Clone)]
pub struct SimulatorService {
    db_pool: Arc<DbPool>,
    anomaly_rate: f64,
}

impl SimulatorService {
    /// Creates a new simulator service instance
    pub fn new(db_pool: Arc<DbPool>, anomaly_rate: f64) -> Self {
        Self {
            db_pool,
            anomaly_rate,
        }
    }

    /// Runs one simulation tick.
    ///
    /// `at` overrides the tick hour (backfill passes historical hours);
    /// `None` means the current hour. The timestamp is truncated to the
    /// top of the hour either way. Returns only the readings actually
    /// written this call; hours already recorded are skipped per point.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        at: Option<DateTime<Utc>>,
    ) -> Result<Vec<meter_reading::Model>, ServiceError> {
        let db = &*self.db_pool;
        let tick = floor_hour(at.unwrap_or_else(Utc::now));

        let profiles = DeviceProfileEntity::find().all(db).await.map_err(|e| {
            error!(error = %e, "Failed to load device profiles");
            ServiceError::DatabaseError(e)
        })?;

        if profiles.is_empty() {
            debug!("No device profiles registered, tick is a no-op");
            return Ok(Vec::new());
        }

        let mut rng = StdRng::from_entropy();
        let mut written = Vec::with_capacity(profiles.len());
        for profile in &profiles {
            if let Some(model) = self.generate_point(&mut rng, profile, tick).await? {
                written.push(model);
            }
        }

        info!(
            tick = %tick,
            points = profiles.len(),
            written = written.len(),
            "Simulation tick completed"
        );
        Ok(written)
    }

    /// Writes one reading and the matching profile advance in a single
    /// transaction. A duplicate (time, point_id) makes the insert a no-op
    /// and the profile's running total must not move.
    async fn generate_point(
        &self,
        rng: &mut StdRng,
        profile: &device_profile::Model,
        tick: DateTime<Utc>,
    ) -> Result<Option<meter_reading::Model>, ServiceError> {
        let db = &*self.db_pool;

        let incr = generate_increment(
            rng,
            profile.mean_value,
            profile.std_value,
            tick.hour(),
            self.anomaly_rate,
        );
        let value = round2(profile.last_value + incr);
        let device_id = device_identity(&profile.point_id);

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, point_id = %profile.point_id, "Failed to start tick transaction");
            ServiceError::DatabaseError(e)
        })?;

        let inserted = MeterReadingEntity::insert(meter_reading::ActiveModel {
            time: Set(tick),
            point_id: Set(profile.point_id.clone()),
            device_id: Set(device_id),
            value: Set(value),
            incr: Set(incr),
        })
        .on_conflict(
            OnConflict::columns([
                meter_reading::Column::Time,
                meter_reading::Column::PointId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(|e| {
            error!(error = %e, point_id = %profile.point_id, "Failed to insert reading");
            ServiceError::DatabaseError(e)
        })?;

        if inserted == 0 {
            txn.rollback().await.map_err(|e| {
                error!(error = %e, point_id = %profile.point_id, "Failed to roll back duplicate tick");
                ServiceError::DatabaseError(e)
            })?;
            debug!(
                point_id = %profile.point_id,
                time = %tick,
                "Reading already recorded, leaving running total unchanged"
            );
            return Ok(None);
        }

        let mut active: device_profile::ActiveModel = profile.clone().into();
        active.last_value = Set(value);
        active.update(&txn).await.map_err(|e| {
            error!(error = %e, point_id = %profile.point_id, "Failed to advance profile running total");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, point_id = %profile.point_id, "Failed to commit tick transaction");
            ServiceError::DatabaseError(e)
        })?;

        Ok(Some(meter_reading::Model {
            time: tick,
            point_id: profile.point_id.clone(),
            device_id,
            value,
            incr,
        }))
    }
}
