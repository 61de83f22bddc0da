use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::AppJson;
use crate::error::AppResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/checkin", get(checkin_status).post(check_in))
}

// POST /api/checkin - отметка прихода на входе
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInRequest {
    reservation_id: String,
}

async fn check_in(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CheckInRequest>,
) -> AppResult<impl IntoResponse> {
    let check_in = state.reservations.check_in(&req.reservation_id).await?;
    Ok((StatusCode::CREATED, Json(json!({ "checkIn": check_in }))))
}

// GET /api/checkin?reservationId=...
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckInQuery {
    reservation_id: String,
}

async fn checkin_status(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CheckInQuery>,
) -> AppResult<impl IntoResponse> {
    let check_in = state.reservations.get_checkin(&params.reservation_id).await?;
    Ok(Json(json!({ "checkIn": check_in })))
}
