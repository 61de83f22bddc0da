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
use crate::services::events::NewTable;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tables", get(list_tables).post(replace_tables))
}

// GET /api/tables?eventId=... - карта зала с занятостью, клиенты опрашивают её
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TablesQuery {
    event_id: String,
}

async fn list_tables(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TablesQuery>,
) -> AppResult<impl IntoResponse> {
    let tables = state.events.list_tables(&params.event_id).await?;
    Ok(Json(json!({ "tables": tables })))
}

// POST /api/tables - полная замена схемы зала события
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceTablesRequest {
    event_id: String,
    tables: Vec<NewTable>,
}

async fn replace_tables(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<ReplaceTablesRequest>,
) -> AppResult<impl IntoResponse> {
    let count = state.events.replace_tables(&req.event_id, req.tables).await?;
    Ok((StatusCode::CREATED, Json(json!({ "count": count }))))
}
