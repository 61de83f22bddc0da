//! Общие помощники для тестов: временная база со схемой и типовые данные.

use chrono::{Duration, Utc};
use tempfile::TempDir;

use crate::config::HoldConfig;
use crate::database::Database;
use crate::models::Event;
use crate::services::cleanup::HoldSweeper;
use crate::services::events::{EventService, NewEvent, NewTable};
use crate::services::payments::PaymentService;
use crate::services::reservations::{CreateHoldRequest, ReservationService};
use crate::services::slips::SlipStorage;

pub struct TestApp {
    pub db: Database,
    pub events: EventService,
    pub reservations: ReservationService,
    pub payments: PaymentService,
    pub sweeper: HoldSweeper,
    _dir: TempDir,
}

pub async fn test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}/test.db", dir.path().display());

    let db = Database::new(&url, 16).await.unwrap();
    db.run_migrations().await.unwrap();

    let hold = HoldConfig { ttl_minutes: 10, sweep_interval_secs: 60 };
    let slip_dir = dir.path().join("slips");
    let slips = SlipStorage::new(&slip_dir.to_string_lossy());

    TestApp {
        events: EventService::new(db.clone()),
        reservations: ReservationService::new(db.clone(), hold),
        payments: PaymentService::new(db.clone(), slips, "0812345678".to_string()),
        sweeper: HoldSweeper::new(db.clone()),
        db,
        _dir: dir,
    }
}

pub fn sample_event() -> NewEvent {
    NewEvent {
        name: "Charity Gala".to_string(),
        date: Utc::now() + Duration::days(30),
        location: "Bangkok".to_string(),
        table_capacity: 10,
        price_per_table: 5000.0,
        deposit_amount: 500.0,
    }
}

/// Столы с номерами "1".."n", вместимость 10, без переопределений.
pub fn sample_tables(n: usize) -> Vec<NewTable> {
    (1..=n)
        .map(|i| NewTable {
            table_no: i.to_string(),
            zone: None,
            capacity: 10,
            price_override: None,
            pos_x: None,
            pos_y: None,
        })
        .collect()
}

pub async fn seed_event_with_tables(
    app: &TestApp,
    n: usize,
) -> (Event, Vec<crate::services::events::TableWithAvailability>) {
    let event = app.events.create_event(sample_event()).await.unwrap();
    app.events.replace_tables(&event.id, sample_tables(n)).await.unwrap();
    let tables = app.events.list_tables(&event.id).await.unwrap();
    (event, tables)
}

pub fn hold_req(event: &Event, table_id: &str) -> CreateHoldRequest {
    CreateHoldRequest {
        event_id: event.id.clone(),
        table_id: table_id.to_string(),
        customer_name: "Somchai".to_string(),
        phone: "0812345678".to_string(),
        qty: None,
    }
}

/// Отодвигает срок удержания в прошлое, имитируя протухший HOLD.
pub async fn force_expire_hold(db: &Database, reservation_id: &str) {
    sqlx::query("UPDATE reservations SET hold_expires_at = ? WHERE id = ?")
        .bind(Utc::now() - Duration::hours(1))
        .bind(reservation_id)
        .execute(&db.pool)
        .await
        .unwrap();
}
