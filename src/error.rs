use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::DatabaseError;
use crate::progression::ProgressionError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Progression(#[from] ProgressionError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Database(err) | AppError::Progression(ProgressionError::Store(err)) => {
                match err {
                    DatabaseError::NotFound => (StatusCode::NOT_FOUND, "Resource not found"),
                    DatabaseError::Duplicate => (StatusCode::CONFLICT, "Resource already exists"),
                    DatabaseError::VersionConflict | DatabaseError::AlreadyCompleted => {
                        (StatusCode::CONFLICT, "Resource conflict")
                    }
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal server error occurred",
                    ),
                }
            }
            AppError::Progression(err) => match err {
                ProgressionError::UnknownModule(_) | ProgressionError::UnknownUser(_) => {
                    (StatusCode::NOT_FOUND, "Resource not found")
                }
                ProgressionError::ModuleLocked { .. } => (StatusCode::FORBIDDEN, "Module locked"),
                ProgressionError::ImmersionRequired(_)
                | ProgressionError::FormNotValid(_)
                | ProgressionError::NotEligible(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "Step requirements not met")
                }
                ProgressionError::UnknownCanvasBlock(_) => (StatusCode::BAD_REQUEST, "Bad request"),
                ProgressionError::CommitConflict => (StatusCode::CONFLICT, "Resource conflict"),
                ProgressionError::Store(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred",
                ),
            },
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "Authentication failed"),
            AppError::Authorization(_) => (StatusCode::FORBIDDEN, "Access denied"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Resource not found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad request"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": error_message,
                "details": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
