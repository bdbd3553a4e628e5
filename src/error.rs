use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Every error surfaces as a JSON body carrying a `success: false` flag and
/// a short human-readable message, never a structured code.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized")]
    Unauthorized,

    #[error("failed to read feedbacks")]
    Storage(#[from] std::io::Error),

    #[error("Failed to send email")]
    Mail(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Mail { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            AppError::Mail(detail) => json!({
                "success": false,
                "message": self.to_string(),
                "error": detail,
            }),
            _ => json!({
                "success": false,
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
