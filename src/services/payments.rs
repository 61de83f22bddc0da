//! payments.rs
//!
//! Оплата депозита и ручная проверка слипов.
//!
//! Поток оплаты:
//! 1.  Гость получает PromptPay QR на сумму депозита события.
//! 2.  Переводит деньги и прикладывает слип (base64 data URL). Бронь
//!     переходит в WAITING_APPROVAL, сумма запоминается в paid_amount.
//! 3.  Админ смотрит слип и выносит решение: APPROVED подтверждает бронь,
//!     REJECTED снимает её и освобождает стол.
//!
//! Слип сохраняется best-effort: бронь важнее картинки, поэтому сбой
//! записи файла не валит оплату. Просроченное удержание снимается прямо
//! при попытке оплаты, не дожидаясь фоновой зачистки.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::database::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Payment, Reservation, ReservationStatus, VerifyStatus};
use crate::promptpay;
use crate::services::slips::SlipStorage;

// --- Request/Response структуры ---

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitPaymentRequest {
    #[validate(length(min = 1, message = "reservationId обязателен"))]
    pub reservation_id: String,
    pub amount: f64,
    /// Слип перевода как data URL (`data:image/png;base64,...`).
    pub slip_data: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPayQuote {
    pub promptpay_id: String,
    pub amount: f64,
    pub payload: String,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Database,
    slips: SlipStorage,
    promptpay_id: String,
}

impl PaymentService {
    pub fn new(db: Database, slips: SlipStorage, promptpay_id: String) -> Self {
        Self { db, slips, promptpay_id }
    }

    /// Принимает слип об оплате и переводит бронь на проверку.
    pub async fn submit_payment(&self, req: SubmitPaymentRequest) -> AppResult<Payment> {
        req.validate()?;

        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
                .bind(&req.reservation_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Бронь не найдена".to_string()))?;

        match reservation.status {
            ReservationStatus::Canceled => {
                return Err(AppError::InvalidState("Бронь отменена".to_string()));
            }
            ReservationStatus::Confirmed => {
                return Err(AppError::InvalidState("Бронь уже подтверждена".to_string()));
            }
            ReservationStatus::Hold => {
                // просроченное удержание снимаем на месте
                if let Some(expires_at) = reservation.hold_expires_at {
                    if expires_at < Utc::now() {
                        sqlx::query(
                            "UPDATE reservations SET status = 'CANCELED', updated_at = ? WHERE id = ? AND status = 'HOLD'",
                        )
                        .bind(Utc::now())
                        .bind(&reservation.id)
                        .execute(&self.db.pool)
                        .await?;
                        return Err(AppError::InvalidState(
                            "Время удержания брони истекло".to_string(),
                        ));
                    }
                }
            }
            // повторная отправка слипа разрешена
            ReservationStatus::WaitingApproval => {}
        }

        if req.amount <= 0.0 {
            return Err(AppError::Validation("Сумма должна быть больше нуля".to_string()));
        }
        if req.amount > reservation.total_amount {
            return Err(AppError::Validation(
                "Сумма превышает стоимость брони".to_string(),
            ));
        }

        let slip_url = match &req.slip_data {
            Some(data) => self.slips.store_data_url(data).await,
            None => None,
        };

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            reservation_id: reservation.id.clone(),
            amount: req.amount,
            method: "PROMPTPAY".to_string(),
            slip_url,
            verify_status: VerifyStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments (id, reservation_id, amount, method, slip_url,
                                  verify_status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.reservation_id)
        .bind(payment.amount)
        .bind(&payment.method)
        .bind(&payment.slip_url)
        .bind(payment.verify_status)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *tx)
        .await?;

        let res = sqlx::query(
            r#"
            UPDATE reservations SET status = 'WAITING_APPROVAL', paid_amount = ?, updated_at = ?
            WHERE id = ? AND status IN ('HOLD', 'WAITING_APPROVAL')
            "#,
        )
        .bind(payment.amount)
        .bind(now)
        .bind(&reservation.id)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 0 {
            // бронь успела поменяться между чтением и записью
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "Бронь изменилась во время оплаты, попробуйте ещё раз".to_string(),
            ));
        }

        tx.commit().await?;

        info!(
            "💳 Payment {} submitted for reservation {} ({:.2})",
            payment.id, reservation.id, payment.amount
        );
        Ok(payment)
    }

    /// Решение по слипу. APPROVED подтверждает бронь, REJECTED снимает её
    /// и обнуляет оплату - стол возвращается в продажу.
    pub async fn decide_payment(
        &self,
        payment_id: &str,
        decision: VerifyStatus,
    ) -> AppResult<Payment> {
        let row = sqlx::query(
            r#"
            SELECT p.verify_status as pstatus, p.reservation_id, r.status as rstatus
            FROM payments p
            JOIN reservations r ON r.id = p.reservation_id
            WHERE p.id = ?
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.db.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Платеж не найден".to_string()))?;

        let verify_status: VerifyStatus = row.get("pstatus");
        let reservation_id: String = row.get("reservation_id");
        let reservation_status: ReservationStatus = row.get("rstatus");

        if verify_status != VerifyStatus::Pending {
            return Err(AppError::InvalidState("Платеж уже проверен".to_string()));
        }

        let now = Utc::now();
        match decision {
            VerifyStatus::Pending => {
                return Err(AppError::Validation(
                    "verifyStatus должен быть APPROVED или REJECTED".to_string(),
                ));
            }
            VerifyStatus::Approved => {
                match reservation_status {
                    ReservationStatus::WaitingApproval => {}
                    ReservationStatus::Canceled => {
                        // отменённая бронь не воскресает
                        return Err(AppError::InvalidState(
                            "Бронь отменена, подтверждать нечего".to_string(),
                        ));
                    }
                    _ => {
                        return Err(AppError::InvalidState(
                            "Бронь не ожидает подтверждения".to_string(),
                        ));
                    }
                }

                let mut tx = self.db.pool.begin().await?;

                let res = sqlx::query(
                    "UPDATE payments SET verify_status = 'APPROVED', updated_at = ? WHERE id = ? AND verify_status = 'PENDING'",
                )
                .bind(now)
                .bind(payment_id)
                .execute(&mut *tx)
                .await?;
                if res.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(AppError::Conflict("Платеж уже обработан".to_string()));
                }

                let res = sqlx::query(
                    "UPDATE reservations SET status = 'CONFIRMED', updated_at = ? WHERE id = ? AND status = 'WAITING_APPROVAL'",
                )
                .bind(now)
                .bind(&reservation_id)
                .execute(&mut *tx)
                .await?;
                if res.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(AppError::Conflict(
                        "Бронь изменилась во время подтверждения".to_string(),
                    ));
                }

                tx.commit().await?;
                info!("💳 Payment {} approved, reservation {} confirmed", payment_id, reservation_id);
            }
            VerifyStatus::Rejected => {
                let mut tx = self.db.pool.begin().await?;

                let res = sqlx::query(
                    "UPDATE payments SET verify_status = 'REJECTED', updated_at = ? WHERE id = ? AND verify_status = 'PENDING'",
                )
                .bind(now)
                .bind(payment_id)
                .execute(&mut *tx)
                .await?;
                if res.rows_affected() == 0 {
                    tx.rollback().await?;
                    return Err(AppError::Conflict("Платеж уже обработан".to_string()));
                }

                // paid_amount обнуляется и для уже отменённой брони;
                // не трогаем только CONFIRMED - её мог подтвердить другой платеж
                sqlx::query(
                    "UPDATE reservations SET status = 'CANCELED', paid_amount = 0, updated_at = ? WHERE id = ? AND status IN ('WAITING_APPROVAL', 'CANCELED')",
                )
                .bind(now)
                .bind(&reservation_id)
                .execute(&mut *tx)
                .await?;

                tx.commit().await?;
                info!("💳 Payment {} rejected, reservation {} released", payment_id, reservation_id);
            }
        }

        self.get_payment(payment_id).await
    }

    pub async fn get_payment(&self, id: &str) -> AppResult<Payment> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.db.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Платеж не найден".to_string()))
    }

    /// PromptPay QR на депозит брони.
    pub async fn promptpay_quote(&self, reservation_id: &str) -> AppResult<PromptPayQuote> {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
                .bind(reservation_id)
                .fetch_optional(&self.db.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("Бронь не найдена".to_string()))?;

        let amount = reservation.deposit_amount;
        let payload = promptpay::build_payload(&self.promptpay_id, Some(amount));
        Ok(PromptPayQuote {
            promptpay_id: self.promptpay_id.clone(),
            amount,
            payload,
        })
    }
}
