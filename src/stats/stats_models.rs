use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// `?type=` selector of the statistics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatsKind {
    #[default]
    General,
    ByType,
    ByResult,
    ByUjier,
    ByZone,
    Daily,
}

impl FromStr for StatsKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(StatsKind::General),
            "by_type" => Ok(StatsKind::ByType),
            "by_result" => Ok(StatsKind::ByResult),
            "by_ujier" => Ok(StatsKind::ByUjier),
            "by_zone" => Ok(StatsKind::ByZone),
            "daily" => Ok(StatsKind::Daily),
            _ => Err("Invalid stats type".to_string()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GeneralStats {
    pub total: i64,
    pub pendientes: i64,
    pub diligenciadas: i64,
    pub diferidas: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct TypeCount {
    #[serde(rename = "type")]
    pub tipo: String,
    pub count: i64,
    #[sqlx(skip)]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ResultCount {
    pub result: String,
    pub count: i64,
    #[sqlx(skip)]
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AgentPerformance {
    pub id: Uuid,
    pub nombre: String,
    pub total: i64,
    pub completed: i64,
    /// Completed over assigned, in percent with two decimals.
    #[sqlx(skip)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ZoneStats {
    pub zone: String,
    pub total: i64,
    pub pendientes: i64,
    pub diligenciadas: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub created: i64,
    pub completed: i64,
}
