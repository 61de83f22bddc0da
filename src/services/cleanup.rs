//! cleanup.rs
//!
//! Фоновая зачистка просроченных удержаний. Пока гость «думает», стол занят;
//! по истечении TTL удержание снимается и места возвращаются в продажу.

use chrono::Utc;
use tracing::info;

use crate::database::Database;

#[derive(Clone)]
pub struct HoldSweeper {
    db: Database,
}

impl HoldSweeper {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Один проход: снимает все HOLD с истёкшим сроком.
    /// Брони на проверке оплаты (WAITING_APPROVAL) не трогаются.
    pub async fn run_once(&self) -> Result<u64, sqlx::Error> {
        let now = Utc::now();
        let res = sqlx::query(
            r#"
            UPDATE reservations SET status = 'CANCELED', updated_at = ?
            WHERE status = 'HOLD'
              AND hold_expires_at IS NOT NULL
              AND datetime(hold_expires_at) < datetime(?)
            "#,
        )
        .bind(now)
        .bind(now)
        .execute(&self.db.pool)
        .await?;

        let released = res.rows_affected();
        if released > 0 {
            info!("🧹 Released {} expired holds", released);
        }
        Ok(released)
    }
}
