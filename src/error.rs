use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Ошибки доменного слоя. Каждый вариант однозначно отображается в HTTP статус.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Недостаточно мест: запрошено {requested}, свободно {available}")]
    CapacityExceeded { requested: i64, available: i64 },

    #[error("{0}")]
    InvalidState(String),

    #[error("Бронь уже отмечена как пришедшая")]
    AlreadyCheckedIn,

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

// Единый формат тела ошибки для всех ручек
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub message: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded { .. }
            | AppError::InvalidState(_)
            | AppError::AlreadyCheckedIn
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Внутренности БД наружу не отдаём, только в лог
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("database error: {:?}", e);
                "Ошибка базы данных".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiError { success: false, message })).into_response()
    }
}
