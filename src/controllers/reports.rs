use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::AppResult;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/reports", get(event_report))
}

// GET /api/reports?eventId=... - сводка для админки
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportQuery {
    event_id: String,
}

async fn event_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReportQuery>,
) -> AppResult<impl IntoResponse> {
    let report = state.events.event_report(&params.event_id).await?;
    Ok(Json(json!({ "report": report })))
}
