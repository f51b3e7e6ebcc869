use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(nullable)]
    pub point_id: Option<String>,
    #[sea_orm(nullable)]
    pub device_id: Option<i64>,
    pub alert_type: AlertKind,
    pub severity: Severity,
    pub message: String,
    #[sea_orm(nullable)]
    pub value: Option<f64>,
    #[sea_orm(nullable)]
    pub threshold: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum AlertKind {
    #[sea_orm(string_value = "THRESHOLD")]
    #[serde(rename = "THRESHOLD")]
    Threshold,
    #[sea_orm(string_value = "TREND_SPIKE")]
    #[serde(rename = "TREND_SPIKE")]
    TrendSpike,
    #[sea_orm(string_value = "TREND_DROP")]
    #[serde(rename = "TREND_DROP")]
    TrendDrop,
    #[sea_orm(string_value = "OFFLINE")]
    #[serde(rename = "OFFLINE")]
    Offline,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Threshold => "THRESHOLD",
            AlertKind::TrendSpike => "TREND_SPIKE",
            AlertKind::TrendDrop => "TREND_DROP",
            AlertKind::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum Severity {
    #[sea_orm(string_value = "INFO")]
    #[serde(rename = "INFO")]
    Info,
    #[sea_orm(string_value = "WARNING")]
    #[serde(rename = "WARNING")]
    Warning,
    #[sea_orm(string_value = "HIGH")]
    #[serde(rename = "HIGH")]
    High,
    #[sea_orm(string_value = "CRITICAL")]
    #[serde(rename = "CRITICAL")]
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
