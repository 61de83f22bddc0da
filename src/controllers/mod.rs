use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::{Json, Router};
use std::sync::Arc;

use crate::error::AppError;
use crate::AppState;

pub mod checkin;
pub mod events;
pub mod payments;
pub mod reports;
pub mod reservations;
pub mod tables;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(events::routes())
        .merge(tables::routes())
        .merge(reservations::routes())
        .merge(payments::routes())
        .merge(checkin::routes())
        .merge(reports::routes())
}

// Json, который отдаёт ошибку разбора в общем формате API,
// а не голым текстом axum
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}
