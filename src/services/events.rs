use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;
use validator::Validate;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventStatus, ReservationStatus, Table, TableStatus};
use crate::services::capacity::{occupied_qty, TableAvailability, TableOccupancy, ACTIVE_STATUSES_SQL};

// --- Request/Response структуры ---

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    #[validate(length(min = 1, message = "название не может быть пустым"))]
    pub name: String,
    pub date: DateTime<Utc>,
    #[validate(length(min = 1, message = "место проведения не может быть пустым"))]
    pub location: String,
    #[validate(range(min = 1, message = "вместимость стола должна быть > 0"))]
    pub table_capacity: i64,
    #[validate(range(min = 0.01, message = "цена стола должна быть > 0"))]
    pub price_per_table: f64,
    #[validate(range(min = 0.01, message = "размер депозита должен быть > 0"))]
    pub deposit_amount: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTable {
    #[validate(length(min = 1, message = "номер стола не может быть пустым"))]
    pub table_no: String,
    pub zone: Option<String>,
    #[validate(range(min = 1, message = "вместимость стола должна быть > 0"))]
    pub capacity: i64,
    pub price_override: Option<f64>,
    pub pos_x: Option<f64>,
    pub pos_y: Option<f64>,
}

/// Стол вместе с вычисленной занятостью. Доступность считается на сервере,
/// клиент её не перевычисляет.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableWithAvailability {
    #[serde(flatten)]
    pub table: Table,
    pub occupied: i64,
    pub available: i64,
    pub availability: TableAvailability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventReport {
    pub event_id: String,
    pub total_tables: i64,
    pub reserved_tables: i64,
    pub available_tables: i64,
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub confirmed_count: i64,
    pub pending_count: i64,
}

#[derive(Clone)]
pub struct EventService {
    db: Database,
}

impl EventService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn create_event(&self, req: NewEvent) -> AppResult<Event> {
        req.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO events (id, name, date, location, table_capacity, price_per_table, deposit_amount, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&req.name)
        .bind(req.date)
        .bind(&req.location)
        .bind(req.table_capacity)
        .bind(req.price_per_table)
        .bind(req.deposit_amount)
        .bind(EventStatus::Active)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        self.get_event(&id).await
    }

    /// Список событий, свежие даты сверху. Публичная афиша передаёт
    /// фильтр ACTIVE, админка смотрит всё.
    pub async fn list_events(&self, status: Option<EventStatus>) -> AppResult<Vec<Event>> {
        let events = match status {
            Some(status) => {
                sqlx::query_as::<_, Event>(
                    "SELECT * FROM events WHERE status = ? ORDER BY datetime(date) DESC",
                )
                .bind(status)
                .fetch_all(&self.db.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY datetime(date) DESC")
                    .fetch_all(&self.db.pool)
                    .await?
            }
        };
        Ok(events)
    }

    pub async fn get_event(&self, id: &str) -> AppResult<Event> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Событие не найдено".to_string()))
    }

    pub async fn update_event_status(&self, id: &str, status: EventStatus) -> AppResult<Event> {
        let res = sqlx::query("UPDATE events SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Событие не найдено".to_string()));
        }
        self.get_event(id).await
    }

    /// Каскад в схеме удалит столы, брони, платежи и чекины события.
    pub async fn delete_event(&self, id: &str) -> AppResult<()> {
        let res = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(id)
            .execute(&self.db.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("Событие не найдено".to_string()));
        }
        tracing::info!("🗑️ Event {} deleted", id);
        Ok(())
    }

    /// Полная замена схемы зала: старые столы удаляются вместе с их бронями,
    /// новые создаются одной транзакцией.
    pub async fn replace_tables(&self, event_id: &str, tables: Vec<NewTable>) -> AppResult<u64> {
        for table in &tables {
            table.validate()?;
        }

        // событие должно существовать
        self.get_event(event_id).await?;

        let mut tx = self.db.pool.begin().await?;

        sqlx::query("DELETE FROM tables WHERE event_id = ?")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;

        let mut count: u64 = 0;
        for table in tables {
            let res = sqlx::query(
                "INSERT INTO tables (id, event_id, table_no, zone, capacity, price_override, pos_x, pos_y, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(event_id)
            .bind(&table.table_no)
            .bind(table.zone.as_deref().unwrap_or("General"))
            .bind(table.capacity)
            .bind(table.price_override)
            .bind(table.pos_x.unwrap_or(0.0))
            .bind(table.pos_y.unwrap_or(0.0))
            .bind(TableStatus::Open)
            .execute(&mut *tx)
            .await?;
            count += res.rows_affected();
        }

        tx.commit().await?;
        tracing::info!("🪑 Layout replaced for event {}: {} tables", event_id, count);
        Ok(count)
    }

    /// Столы события с занятостью, посчитанной по активным броням.
    pub async fn list_tables(&self, event_id: &str) -> AppResult<Vec<TableWithAvailability>> {
        self.get_event(event_id).await?;

        let sql = format!(
            r#"
            SELECT t.id as tid, t.event_id as eid, t.table_no, t.zone, t.capacity,
                   t.price_override, t.pos_x, t.pos_y, t.status as tstatus,
                   r.status as rstatus, r.qty as rqty
            FROM tables t
            LEFT JOIN reservations r
                   ON r.table_id = t.id AND r.status IN {statuses}
            WHERE t.event_id = ?
            ORDER BY t.table_no, t.id
            "#,
            statuses = ACTIVE_STATUSES_SQL
        );

        let rows = sqlx::query(&sql)
            .bind(event_id)
            .fetch_all(&self.db.pool)
            .await?;

        // строки отсортированы по столу, собираем группы за один проход
        let mut grouped: Vec<(Table, Vec<(ReservationStatus, i64)>)> = Vec::new();
        for row in rows {
            let tid: String = row.get("tid");
            let start_new = grouped.last().map(|(t, _)| t.id != tid).unwrap_or(true);
            if start_new {
                grouped.push((
                    Table {
                        id: tid,
                        event_id: row.get("eid"),
                        table_no: row.get("table_no"),
                        zone: row.get("zone"),
                        capacity: row.get("capacity"),
                        price_override: row.get("price_override"),
                        pos_x: row.get("pos_x"),
                        pos_y: row.get("pos_y"),
                        status: row.get("tstatus"),
                    },
                    Vec::new(),
                ));
            }

            let status: Option<ReservationStatus> = row.get("rstatus");
            if let Some(status) = status {
                let qty: Option<i64> = row.get("rqty");
                if let Some((_, reservations)) = grouped.last_mut() {
                    reservations.push((status, qty.unwrap_or(0)));
                }
            }
        }

        let result = grouped
            .into_iter()
            .map(|(table, reservations)| {
                let occupancy = TableOccupancy {
                    capacity: table.capacity,
                    occupied: occupied_qty(reservations),
                };
                TableWithAvailability {
                    occupied: occupancy.occupied,
                    available: occupancy.available(),
                    availability: occupancy.availability(table.status),
                    table,
                }
            })
            .collect();

        Ok(result)
    }

    /// Сводка по событию: столы, выручка и очередь на проверку.
    pub async fn event_report(&self, event_id: &str) -> AppResult<EventReport> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM tables t WHERE t.event_id = e.id) as total_tables,
                (SELECT COUNT(DISTINCT r.table_id) FROM reservations r
                  WHERE r.event_id = e.id AND r.status = 'CONFIRMED') as reserved_tables,
                (SELECT COALESCE(SUM(r.paid_amount), 0.0) FROM reservations r
                  WHERE r.event_id = e.id AND r.status = 'CONFIRMED') as total_revenue,
                (SELECT COALESCE(SUM(r.paid_amount), 0.0) FROM reservations r
                  WHERE r.event_id = e.id AND r.status = 'WAITING_APPROVAL') as pending_revenue,
                (SELECT COUNT(*) FROM reservations r
                  WHERE r.event_id = e.id AND r.status = 'CONFIRMED') as confirmed_count,
                (SELECT COUNT(*) FROM reservations r
                  WHERE r.event_id = e.id AND r.status = 'WAITING_APPROVAL') as pending_count
            FROM events e
            WHERE e.id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Событие не найдено".to_string()))?;

        let total_tables: i64 = row.get("total_tables");
        let reserved_tables: i64 = row.get("reserved_tables");

        Ok(EventReport {
            event_id: event_id.to_string(),
            total_tables,
            reserved_tables,
            available_tables: total_tables - reserved_tables,
            total_revenue: row.get("total_revenue"),
            pending_revenue: row.get("pending_revenue"),
            confirmed_count: row.get("confirmed_count"),
            pending_count: row.get("pending_count"),
        })
    }
}
