use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppJson;
use crate::error::AppResult;
use crate::models::VerifyStatus;
use crate::services::payments::SubmitPaymentRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments", post(submit_payment))
        .route("/payments/{id}", patch(decide_payment))
        .route("/payments/promptpay", get(promptpay_quote))
}

// POST /api/payments - слип об оплате депозита
async fn submit_payment(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SubmitPaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let payment = state.payments.submit_payment(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "payment": payment }))))
}

// PATCH /api/payments/{id} - решение админа по слипу
#[derive(Debug, Deserialize)]
struct DecidePaymentRequest {
    decision: VerifyStatus,
}

async fn decide_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<DecidePaymentRequest>,
) -> AppResult<impl IntoResponse> {
    let payment = state.payments.decide_payment(&id, req.decision).await?;
    Ok(Json(json!({ "payment": payment })))
}

// GET /api/payments/promptpay?reservationId=... - строка для QR на депозит
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptPayQuery {
    reservation_id: String,
}

async fn promptpay_quote(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PromptPayQuery>,
) -> AppResult<impl IntoResponse> {
    let quote = state.payments.promptpay_quote(&params.reservation_id).await?;
    Ok(Json(quote))
}
