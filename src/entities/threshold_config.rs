use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::alert::Severity;

/// Static detection bounds for a monitoring point. Either bound may be
/// absent; a row with both absent disables the threshold pass for that
/// point without deleting its severity choice.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "threshold_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(nullable)]
    pub point_id: Option<String>,
    #[sea_orm(nullable)]
    pub device_id: Option<i64>,
    pub metric: String,
    #[sea_orm(nullable)]
    pub min_value: Option<f64>,
    #[sea_orm(nullable)]
    pub max_value: Option<f64>,
    pub severity: Severity,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
