use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One simulated hourly reading. The composite key enforces the
/// one-reading-per-(hour, point) invariant; duplicate ticks are rejected by
/// the store, not by application checks.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meter_readings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub time: DateTime<Utc>,
    #[sea_orm(primary_key, auto_increment = false)]
    pub point_id: String,
    /// Derived numeric identity, display/legacy use only.
    pub device_id: i64,
    /// Cumulative consumption after this tick.
    pub value: f64,
    /// This tick's increment, always >= 0.
    pub incr: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
