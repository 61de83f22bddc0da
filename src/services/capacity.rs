//! capacity.rs
//!
//! Чистая арифметика занятости столов. Единственное место, где определено,
//! какие брони удерживают места и как считается доступность. SQL-запросы
//! используют тот же набор статусов через `ACTIVE_STATUSES_SQL`.

use serde::Serialize;

use crate::models::{ReservationStatus, TableStatus};

/// SQL-фрагмент активных статусов для подзапросов занятости.
/// Обязан совпадать с `ReservationStatus::is_active` (см. тест ниже).
pub const ACTIVE_STATUSES_SQL: &str = "('HOLD','WAITING_APPROVAL','CONFIRMED')";

/// Как стол показывается на схеме зала.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableAvailability {
    Available,
    Hold,
    Reserved,
    Closed,
}

/// Снимок занятости одного стола.
#[derive(Debug, Clone, Copy)]
pub struct TableOccupancy {
    pub capacity: i64,
    pub occupied: i64,
}

impl TableOccupancy {
    pub fn available(&self) -> i64 {
        (self.capacity - self.occupied).max(0)
    }

    /// Пройдёт ли запрошенное количество мест.
    pub fn can_admit(&self, qty: i64) -> bool {
        qty > 0 && self.occupied + qty <= self.capacity
    }

    /// Статус стола для схемы зала. Закрытый стол всегда CLOSED,
    /// дальше решает занятость: пустой / частично занят / заполнен.
    pub fn availability(&self, table_status: TableStatus) -> TableAvailability {
        if table_status == TableStatus::Closed {
            return TableAvailability::Closed;
        }
        if self.occupied <= 0 {
            TableAvailability::Available
        } else if self.occupied >= self.capacity {
            TableAvailability::Reserved
        } else {
            TableAvailability::Hold
        }
    }
}

/// Суммирует места, удерживаемые активными бронями.
pub fn occupied_qty<I>(reservations: I) -> i64
where
    I: IntoIterator<Item = (ReservationStatus, i64)>,
{
    reservations
        .into_iter()
        .filter(|(status, _)| status.is_active())
        .map(|(_, qty)| qty)
        .sum()
}
