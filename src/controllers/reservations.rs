use axum::{
    extract::{Path, Query, State},
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
use crate::services::reservations::CreateHoldRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reservations", get(list_reservations).post(create_hold))
        .route(
            "/reservations/{id}",
            get(get_reservation).delete(cancel_reservation),
        )
}

// POST /api/reservations - удержание стола на время оплаты
async fn create_hold(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateHoldRequest>,
) -> AppResult<impl IntoResponse> {
    let reservation = state.reservations.create_hold(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "reservation": reservation }))))
}

// GET /api/reservations?eventId=... - админский список с платежами
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservationsQuery {
    event_id: Option<String>,
}

async fn list_reservations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReservationsQuery>,
) -> AppResult<impl IntoResponse> {
    let reservations = state.reservations.list(params.event_id.as_deref()).await?;
    Ok(Json(json!({ "reservations": reservations })))
}

// GET /api/reservations/{id}
async fn get_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let reservation = state.reservations.get_detail(&id).await?;
    Ok(Json(json!({ "reservation": reservation })))
}

// DELETE /api/reservations/{id} - отмена, повторный вызов безвреден
async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.reservations.cancel(&id).await?;
    Ok(Json(json!({ "success": true })))
}
