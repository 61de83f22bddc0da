use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub table_capacity: i64,
    pub price_per_table: f64,
    pub deposit_amount: f64,
    pub status: EventStatus,
    pub created_at: DateTime<Utc>,
}
