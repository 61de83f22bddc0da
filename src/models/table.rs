use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Open,
    Closed,
}

/// Стол на схеме зала. `table_no` - человекочитаемый номер ("A1", "12"),
/// служит только подписью на карте.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: String,
    pub event_id: String,
    pub table_no: String,
    pub zone: String,
    pub capacity: i64,
    pub price_override: Option<f64>,
    pub pos_x: f64,
    pub pos_y: f64,
    pub status: TableStatus,
}
