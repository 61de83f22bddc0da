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
use crate::models::EventStatus;
use crate::services::events::NewEvent;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route(
            "/events/{id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
}

// GET /api/events?status=ACTIVE
#[derive(Debug, Deserialize)]
struct EventsQuery {
    status: Option<EventStatus>,
}

async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> AppResult<impl IntoResponse> {
    let events = state.events.list_events(params.status).await?;
    Ok(Json(json!({ "events": events })))
}

// POST /api/events
async fn create_event(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<NewEvent>,
) -> AppResult<impl IntoResponse> {
    let event = state.events.create_event(req).await?;
    Ok((StatusCode::CREATED, Json(json!({ "event": event }))))
}

// GET /api/events/{id}
async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let event = state.events.get_event(&id).await?;
    Ok(Json(json!({ "event": event })))
}

// PATCH /api/events/{id} - меняется только статус
#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    status: EventStatus,
}

async fn update_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    AppJson(req): AppJson<UpdateEventRequest>,
) -> AppResult<impl IntoResponse> {
    let event = state.events.update_event_status(&id, req.status).await?;
    Ok(Json(json!({ "event": event })))
}

// DELETE /api/events/{id}
async fn delete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.events.delete_event(&id).await?;
    Ok(Json(json!({ "success": true })))
}
