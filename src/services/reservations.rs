//! reservations.rs
//!
//! Сервисный слой жизненного цикла брони: удержание стола, отмена и чекин.
//!
//! Ключевые моменты:
//! 1.  **Атомарный захват мест**: создание удержания выполняется одним
//!     `INSERT ... SELECT` с проверкой вместимости внутри запроса. SQLite
//!     сериализует писателей, поэтому из двух конкурирующих запросов на
//!     последние места пройдёт ровно один, без блокировок в коде.
//! 2.  **Классификация отказа**: если вставка не прошла, причина выясняется
//!     повторным чтением - не найдено / закрыто / не хватило мест / гонка.
//! 3.  **Чекин**: повторный приход ловится UNIQUE-ограничением по брони,
//!     выигрывает первая запись.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::config::HoldConfig;
use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{
    CheckIn, Event, EventStatus, Payment, Reservation, ReservationStatus, Table, TableStatus,
};
use crate::services::capacity::{TableOccupancy, ACTIVE_STATUSES_SQL};

// --- Request/Response структуры ---

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateHoldRequest {
    #[validate(length(min = 1, message = "eventId обязателен"))]
    pub event_id: String,
    #[validate(length(min = 1, message = "tableId обязателен"))]
    pub table_id: String,
    #[validate(length(min = 1, message = "имя не может быть пустым"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "телефон не может быть пустым"))]
    pub phone: String,
    /// Количество мест; по умолчанию - весь стол.
    #[validate(range(min = 1, message = "qty должен быть > 0"))]
    pub qty: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationDetail {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub table: Table,
    pub event: Event,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInDetail {
    #[serde(flatten)]
    pub check_in: CheckIn,
    pub reservation: ReservationDetail,
}

#[derive(Clone)]
pub struct ReservationService {
    db: Database,
    hold: HoldConfig,
}

/// Общий SELECT брони вместе со столом и событием.
fn detail_sql(filter: &str) -> String {
    format!(
        r#"
        SELECT r.id as rid, r.event_id as reid, r.table_id as rtid, r.customer_name, r.phone,
               r.qty, r.total_amount, r.deposit_amount as rdeposit, r.paid_amount,
               r.status as rstatus, r.hold_expires_at, r.created_at as rcreated,
               r.updated_at as rupdated,
               t.table_no, t.zone, t.capacity, t.price_override, t.pos_x, t.pos_y,
               t.status as tstatus,
               e.name as ename, e.date as edate, e.location, e.table_capacity,
               e.price_per_table, e.deposit_amount as edeposit, e.status as estatus,
               e.created_at as ecreated
        FROM reservations r
        JOIN tables t ON t.id = r.table_id
        JOIN events e ON e.id = r.event_id
        {filter}
        ORDER BY datetime(r.created_at) DESC
        "#
    )
}

fn detail_from_row(row: &SqliteRow) -> (Reservation, Table, Event) {
    let reservation = Reservation {
        id: row.get("rid"),
        event_id: row.get("reid"),
        table_id: row.get("rtid"),
        customer_name: row.get("customer_name"),
        phone: row.get("phone"),
        qty: row.get("qty"),
        total_amount: row.get("total_amount"),
        deposit_amount: row.get("rdeposit"),
        paid_amount: row.get("paid_amount"),
        status: row.get("rstatus"),
        hold_expires_at: row.get("hold_expires_at"),
        created_at: row.get("rcreated"),
        updated_at: row.get("rupdated"),
    };
    let table = Table {
        id: reservation.table_id.clone(),
        event_id: reservation.event_id.clone(),
        table_no: row.get("table_no"),
        zone: row.get("zone"),
        capacity: row.get("capacity"),
        price_override: row.get("price_override"),
        pos_x: row.get("pos_x"),
        pos_y: row.get("pos_y"),
        status: row.get("tstatus"),
    };
    let event = Event {
        id: reservation.event_id.clone(),
        name: row.get("ename"),
        date: row.get("edate"),
        location: row.get("location"),
        table_capacity: row.get("table_capacity"),
        price_per_table: row.get("price_per_table"),
        deposit_amount: row.get("edeposit"),
        status: row.get("estatus"),
        created_at: row.get("ecreated"),
    };
    (reservation, table, event)
}

impl ReservationService {
    pub fn new(db: Database, hold: HoldConfig) -> Self {
        Self { db, hold }
    }

    /// Создаёт удержание стола на `hold.ttl_minutes` минут.
    ///
    /// Сумма брони - цена стола (override стола или цена события), депозит
    /// берётся из события. Без qty удерживается весь стол.
    pub async fn create_hold(&self, req: CreateHoldRequest) -> AppResult<Reservation> {
        req.validate()?;

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let expires_at = now + Duration::minutes(self.hold.ttl_minutes);

        // Проверка вместимости и вставка - один запрос, гонщики сериализуются в SQLite
        let sql = format!(
            r#"
            INSERT INTO reservations (id, event_id, table_id, customer_name, phone, qty,
                                      total_amount, deposit_amount, paid_amount, status,
                                      hold_expires_at, created_at, updated_at)
            SELECT ?, t.event_id, t.id, ?, ?, COALESCE(?, t.capacity),
                   COALESCE(t.price_override, e.price_per_table), e.deposit_amount, 0, 'HOLD',
                   ?, ?, ?
            FROM tables t
            JOIN events e ON e.id = t.event_id
            WHERE t.id = ? AND t.event_id = ?
              AND t.status = 'OPEN'
              AND e.status = 'ACTIVE'
              AND (SELECT COALESCE(SUM(r.qty), 0) FROM reservations r
                    WHERE r.table_id = t.id AND r.status IN {statuses})
                  + COALESCE(?, t.capacity) <= t.capacity
            "#,
            statuses = ACTIVE_STATUSES_SQL
        );

        let res = sqlx::query(&sql)
            .bind(&id)
            .bind(&req.customer_name)
            .bind(&req.phone)
            .bind(req.qty)
            .bind(expires_at)
            .bind(now)
            .bind(now)
            .bind(&req.table_id)
            .bind(&req.event_id)
            .bind(req.qty)
            .execute(&self.db.pool)
            .await?;

        if res.rows_affected() == 0 {
            return Err(self.classify_hold_rejection(&req).await);
        }

        info!("🔒 Hold {} on table {} for {}", id, req.table_id, req.customer_name);
        self.get_reservation(&id).await
    }

    /// Выясняет, почему вставка удержания не прошла.
    async fn classify_hold_rejection(&self, req: &CreateHoldRequest) -> AppError {
        let sql = format!(
            r#"
            SELECT e.status as estatus, t.status as tstatus, t.capacity,
                   (SELECT COALESCE(SUM(r.qty), 0) FROM reservations r
                     WHERE r.table_id = t.id AND r.status IN {statuses}) as occupied
            FROM tables t
            JOIN events e ON e.id = t.event_id
            WHERE t.id = ? AND t.event_id = ?
            "#,
            statuses = ACTIVE_STATUSES_SQL
        );

        let row = match sqlx::query(&sql)
            .bind(&req.table_id)
            .bind(&req.event_id)
            .fetch_optional(&self.db.pool)
            .await
        {
            Ok(row) => row,
            Err(e) => return AppError::Database(e),
        };

        let row = match row {
            Some(row) => row,
            None => return AppError::NotFound("Событие или стол не найдены".to_string()),
        };

        let event_status: EventStatus = row.get("estatus");
        if event_status != EventStatus::Active {
            return AppError::InvalidState("Событие закрыто для бронирования".to_string());
        }

        let table_status: TableStatus = row.get("tstatus");
        if table_status != TableStatus::Open {
            return AppError::InvalidState("Стол закрыт для бронирования".to_string());
        }

        let occupancy = TableOccupancy {
            capacity: row.get("capacity"),
            occupied: row.get("occupied"),
        };
        let requested = req.qty.unwrap_or(occupancy.capacity);
        if !occupancy.can_admit(requested) {
            return AppError::CapacityExceeded {
                requested,
                available: occupancy.available(),
            };
        }

        // к моменту перечитывания места снова появились - это была гонка
        AppError::Conflict("Не удалось создать бронь, попробуйте ещё раз".to_string())
    }

    pub async fn get_reservation(&self, id: &str) -> AppResult<Reservation> {
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Бронь не найдена".to_string()))
    }

    /// Бронь вместе со столом, событием и платежами.
    pub async fn get_detail(&self, id: &str) -> AppResult<ReservationDetail> {
        let row = sqlx::query(&detail_sql("WHERE r.id = ?"))
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Бронь не найдена".to_string()))?;

        let (reservation, table, event) = detail_from_row(&row);

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE reservation_id = ? ORDER BY datetime(created_at)",
        )
        .bind(id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(ReservationDetail { reservation, table, event, payments })
    }

    /// Список броней (свежие сверху), опционально по событию.
    pub async fn list(&self, event_id: Option<&str>) -> AppResult<Vec<ReservationDetail>> {
        let sql = match event_id {
            Some(_) => detail_sql("WHERE r.event_id = ?"),
            None => detail_sql(""),
        };

        let mut query = sqlx::query(&sql);
        if let Some(eid) = event_id {
            query = query.bind(eid);
        }
        let rows = query.fetch_all(&self.db.pool).await?;

        let details: Vec<(Reservation, Table, Event)> =
            rows.iter().map(detail_from_row).collect();
        if details.is_empty() {
            return Ok(Vec::new());
        }

        // платежи всех броней одним запросом, потом раскладываем по своим
        let placeholders = vec!["?"; details.len()].join(",");
        let payments_sql = format!(
            "SELECT * FROM payments WHERE reservation_id IN ({}) ORDER BY datetime(created_at)",
            placeholders
        );
        let mut payments_query = sqlx::query_as::<_, Payment>(&payments_sql);
        for (reservation, _, _) in &details {
            payments_query = payments_query.bind(&reservation.id);
        }
        let payments = payments_query.fetch_all(&self.db.pool).await?;

        let mut by_reservation: BTreeMap<String, Vec<Payment>> = BTreeMap::new();
        for payment in payments {
            by_reservation
                .entry(payment.reservation_id.clone())
                .or_default()
                .push(payment);
        }

        Ok(details
            .into_iter()
            .map(|(reservation, table, event)| ReservationDetail {
                payments: by_reservation.remove(&reservation.id).unwrap_or_default(),
                reservation,
                table,
                event,
            })
            .collect())
    }

    /// Отмена брони. Повторная отмена - no-op, из CANCELED выхода нет,
    /// поэтому места освобождаются ровно один раз.
    pub async fn cancel(&self, id: &str) -> AppResult<()> {
        let status = sqlx::query_scalar::<_, ReservationStatus>(
            "SELECT status FROM reservations WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Бронь не найдена".to_string()))?;

        if !status.can_transition(ReservationStatus::Canceled) {
            // уже отменена
            return Ok(());
        }

        sqlx::query(
            "UPDATE reservations SET status = 'CANCELED', updated_at = ? WHERE id = ? AND status != 'CANCELED'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.db.pool)
        .await?;

        info!("🚫 Reservation {} canceled", id);
        Ok(())
    }

    /// Отмечает приход гостя. Только для подтверждённых броней,
    /// повторный чекин отклоняется.
    pub async fn check_in(&self, reservation_id: &str) -> AppResult<CheckIn> {
        let check_in = CheckIn {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation_id.to_string(),
            checked_in_at: Utc::now(),
        };

        // статус проверяется тем же стейтментом, что и вставка:
        // отмена между чтением и записью чекин не пропустит
        let res = sqlx::query(
            r#"
            INSERT INTO check_ins (id, reservation_id, checked_in_at)
            SELECT ?, r.id, ?
            FROM reservations r
            WHERE r.id = ? AND r.status = 'CONFIRMED'
            "#,
        )
        .bind(&check_in.id)
        .bind(check_in.checked_in_at)
        .bind(reservation_id)
        .execute(&self.db.pool)
        .await;

        match res {
            Ok(r) if r.rows_affected() > 0 => {
                info!("✅ Check-in: reservation {}", reservation_id);
                Ok(check_in)
            }
            Ok(_) => Err(self.classify_checkin_rejection(reservation_id).await),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AppError::AlreadyCheckedIn)
            }
            Err(e) => Err(e.into()),
        }
    }

    // вставка не прошла - перечитываем бронь, чтобы назвать причину
    async fn classify_checkin_rejection(&self, reservation_id: &str) -> AppError {
        let status = sqlx::query_scalar::<_, ReservationStatus>(
            "SELECT status FROM reservations WHERE id = ?",
        )
        .bind(reservation_id)
        .fetch_optional(&self.db.pool)
        .await;

        match status {
            Ok(None) => AppError::NotFound("Бронь не найдена".to_string()),
            Ok(Some(ReservationStatus::Canceled)) => {
                AppError::InvalidState("Бронь отменена".to_string())
            }
            Ok(Some(_)) => AppError::InvalidState("Бронь ещё не подтверждена".to_string()),
            Err(e) => e.into(),
        }
    }

    /// Статус чекина по брони (для экрана на входе).
    pub async fn get_checkin(&self, reservation_id: &str) -> AppResult<CheckInDetail> {
        let check_in = sqlx::query_as::<_, CheckIn>(
            "SELECT * FROM check_ins WHERE reservation_id = ?",
        )
        .bind(reservation_id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Чекина по этой брони ещё не было".to_string()))?;

        let reservation = self.get_detail(reservation_id).await?;
        Ok(CheckInDetail { check_in, reservation })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{hold_req, sample_event, sample_tables, seed_event_with_tables, test_app};

    #[tokio::test]
    async fn hold_defaults_to_whole_table() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let before = Utc::now();
        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();

        assert_eq!(reservation.status, ReservationStatus::Hold);
        assert_eq!(reservation.qty, 10);
        assert_eq!(reservation.total_amount, 5000.0);
        assert_eq!(reservation.deposit_amount, 500.0);
        assert_eq!(reservation.paid_amount, 0.0);

        let expires = reservation.hold_expires_at.expect("hold has expiry");
        assert!(expires > before + Duration::minutes(9));
        assert!(expires < before + Duration::minutes(11));
    }

    #[tokio::test]
    async fn price_override_wins_over_event_price() {
        let app = test_app().await;
        let event = app.events.create_event(sample_event()).await.unwrap();
        let mut tables = sample_tables(1);
        tables[0].price_override = Some(7000.0);
        app.events.replace_tables(&event.id, tables).await.unwrap();
        let tables = app.events.list_tables(&event.id).await.unwrap();

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();
        assert_eq!(reservation.total_amount, 7000.0);
    }

    #[tokio::test]
    async fn partial_quantities_share_table() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        let table_id = &tables[0].table.id;

        let mut req = hold_req(&event, table_id);
        req.qty = Some(4);
        app.reservations.create_hold(req).await.unwrap();

        let mut req = hold_req(&event, table_id);
        req.qty = Some(6);
        app.reservations.create_hold(req).await.unwrap();

        // стол заполнен ровно до вместимости
        let mut req = hold_req(&event, table_id);
        req.qty = Some(1);
        let err = app.reservations.create_hold(req).await.unwrap_err();
        match err {
            AppError::CapacityExceeded { requested, available } => {
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            other => panic!("ожидали CapacityExceeded, получили {:?}", other),
        }
    }

    #[tokio::test]
    async fn full_table_rejects_next_hold() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        let table_id = &tables[0].table.id;

        app.reservations.create_hold(hold_req(&event, table_id)).await.unwrap();

        let err = app
            .reservations
            .create_hold(hold_req(&event, table_id))
            .await
            .unwrap_err();
        match err {
            AppError::CapacityExceeded { requested, available } => {
                assert_eq!(requested, 10);
                assert_eq!(available, 0);
            }
            other => panic!("ожидали CapacityExceeded, получили {:?}", other),
        }
    }

    #[tokio::test]
    async fn qty_must_be_positive() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let mut req = hold_req(&event, &tables[0].table.id);
        req.qty = Some(0);
        let err = app.reservations.create_hold(req).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_table_is_not_found() {
        let app = test_app().await;
        let (event, _) = seed_event_with_tables(&app, 1).await;

        let err = app
            .reservations
            .create_hold(hold_req(&event, "no-such-table"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn table_must_belong_to_event() {
        let app = test_app().await;
        let (_, tables_a) = seed_event_with_tables(&app, 1).await;
        let (event_b, _) = seed_event_with_tables(&app, 1).await;

        // стол другого события - как будто его нет
        let err = app
            .reservations
            .create_hold(hold_req(&event_b, &tables_a[0].table.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn closed_event_rejects_holds() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        app.events
            .update_event_status(&event.id, EventStatus::Closed)
            .await
            .unwrap();

        let err = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn closed_table_rejects_holds() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        sqlx::query("UPDATE tables SET status = 'CLOSED' WHERE id = ?")
            .bind(&tables[0].table.id)
            .execute(&app.db.pool)
            .await
            .unwrap();

        let err = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_holds_admit_exactly_one() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        let table_id = tables[0].table.id.clone();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let service = app.reservations.clone();
                let mut req = hold_req(&event, &table_id);
                req.customer_name = format!("Guest {}", i);
                tokio::spawn(async move { service.create_hold(req).await })
            })
            .collect();

        let mut winners = 0;
        for task in futures::future::join_all(tasks).await {
            match task.unwrap() {
                Ok(_) => winners += 1,
                Err(AppError::CapacityExceeded { .. }) | Err(AppError::Conflict(_)) => {}
                Err(other) => panic!("неожиданная ошибка гонки: {:?}", other),
            }
        }
        assert_eq!(winners, 1);

        // занятость не превысила вместимость
        let occupied: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(qty), 0) FROM reservations WHERE table_id = ? AND status != 'CANCELED'",
        )
        .bind(&table_id)
        .fetch_one(&app.db.pool)
        .await
        .unwrap();
        assert_eq!(occupied, 10);
    }

    #[tokio::test]
    async fn cancel_frees_capacity() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        let table_id = &tables[0].table.id;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, table_id))
            .await
            .unwrap();

        app.reservations.cancel(&reservation.id).await.unwrap();

        // места вернулись, новая бронь проходит
        app.reservations.create_hold(hold_req(&event, table_id)).await.unwrap();
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();

        app.reservations.cancel(&reservation.id).await.unwrap();
        app.reservations.cancel(&reservation.id).await.unwrap();

        let fetched = app.reservations.get_reservation(&reservation.id).await.unwrap();
        assert_eq!(fetched.status, ReservationStatus::Canceled);
    }

    #[tokio::test]
    async fn cancel_unknown_reservation_is_not_found() {
        let app = test_app().await;
        let err = app.reservations.cancel("no-such-id").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_hold_still_blocks_until_released() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;
        let table_id = &tables[0].table.id;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, table_id))
            .await
            .unwrap();
        crate::test_support::force_expire_hold(&app.db, &reservation.id).await;

        // просроченное удержание занимает места, пока его не снимут
        let err = app
            .reservations
            .create_hold(hold_req(&event, table_id))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded { .. }));
    }

    #[tokio::test]
    async fn check_in_requires_confirmed() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();

        let err = app.reservations.check_in(&reservation.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        sqlx::query("UPDATE reservations SET status = 'CONFIRMED' WHERE id = ?")
            .bind(&reservation.id)
            .execute(&app.db.pool)
            .await
            .unwrap();

        let check_in = app.reservations.check_in(&reservation.id).await.unwrap();
        assert_eq!(check_in.reservation_id, reservation.id);

        let err = app.reservations.check_in(&reservation.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedIn));
    }

    #[tokio::test]
    async fn check_in_after_cancel_is_refused() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();
        app.reservations.cancel(&reservation.id).await.unwrap();

        let err = app.reservations.check_in(&reservation.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));

        let err = app.reservations.check_in("no-such-id").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // ни одной записи о приходе не появилось
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM check_ins")
            .fetch_one(&app.db.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_check_in_single_winner() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();
        sqlx::query("UPDATE reservations SET status = 'CONFIRMED' WHERE id = ?")
            .bind(&reservation.id)
            .execute(&app.db.pool)
            .await
            .unwrap();

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let service = app.reservations.clone();
                let id = reservation.id.clone();
                tokio::spawn(async move { service.check_in(&id).await })
            })
            .collect();

        let mut winners = 0;
        let mut duplicates = 0;
        for task in futures::future::join_all(tasks).await {
            match task.unwrap() {
                Ok(_) => winners += 1,
                Err(AppError::AlreadyCheckedIn) => duplicates += 1,
                Err(other) => panic!("неожиданная ошибка чекина: {:?}", other),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(duplicates, 1);
    }

    #[tokio::test]
    async fn checkin_status_not_found_before_checkin() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 1).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();

        let err = app.reservations.get_checkin(&reservation.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn detail_embeds_table_event_and_payments() {
        let app = test_app().await;
        let (event, tables) = seed_event_with_tables(&app, 2).await;

        let reservation = app
            .reservations
            .create_hold(hold_req(&event, &tables[0].table.id))
            .await
            .unwrap();

        let detail = app.reservations.get_detail(&reservation.id).await.unwrap();
        assert_eq!(detail.reservation.id, reservation.id);
        assert_eq!(detail.table.id, tables[0].table.id);
        assert_eq!(detail.event.id, event.id);
        assert!(detail.payments.is_empty());
    }

    #[tokio::test]
    async fn list_filters_by_event() {
        let app = test_app().await;
        let (event_a, tables_a) = seed_event_with_tables(&app, 1).await;
        let (event_b, _) = seed_event_with_tables(&app, 1).await;

        app.reservations
            .create_hold(hold_req(&event_a, &tables_a[0].table.id))
            .await
            .unwrap();

        let all = app.reservations.list(None).await.unwrap();
        assert_eq!(all.len(), 1);

        let for_a = app.reservations.list(Some(&event_a.id)).await.unwrap();
        assert_eq!(for_a.len(), 1);

        let for_b = app.reservations.list(Some(&event_b.id)).await.unwrap();
        assert!(for_b.is_empty());
    }
}
