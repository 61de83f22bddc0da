use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Жизненный цикл брони:
///
/// ```text
/// HOLD -> WAITING_APPROVAL -> CONFIRMED
///   \           \                /
///    `-----------`--> CANCELED <'
/// ```
///
/// CANCELED - терминальный статус, из него выхода нет.
/// Занятость стола считается по активным статусам (см. `is_active`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Hold,
    WaitingApproval,
    Confirmed,
    Canceled,
}

impl ReservationStatus {
    /// Активные статусы удерживают места за столом.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            ReservationStatus::Hold | ReservationStatus::WaitingApproval | ReservationStatus::Confirmed
        )
    }

    /// Разрешённые переходы между статусами.
    pub fn can_transition(self, next: ReservationStatus) -> bool {
        use ReservationStatus::*;
        match (self, next) {
            (Hold, WaitingApproval) => true,
            (WaitingApproval, Confirmed) => true,
            (Canceled, _) => false,
            (_, Canceled) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub event_id: String,
    pub table_id: String,
    pub customer_name: String,
    pub phone: String,
    pub qty: i64,
    pub total_amount: f64,
    pub deposit_amount: f64,
    pub paid_amount: f64,
    pub status: ReservationStatus,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
