use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-point simulation state. `last_value` is the running total every tick
/// compounds on; it is advanced in the same transaction as the reading
/// insert and never moves for a duplicate tick.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub point_id: String,
    pub mean_value: f64,
    pub std_value: f64,
    #[sea_orm(nullable)]
    pub min_value: Option<f64>,
    #[sea_orm(nullable)]
    pub max_value: Option<f64>,
    pub last_value: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
