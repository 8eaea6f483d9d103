use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::model::{ItemLookupError, ScraperError};

/// HTTP-facing error; the body is always `{"error": ...}`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ItemLookupError> for AppError {
    fn from(err: ItemLookupError) -> Self {
        match err {
            ItemLookupError::MissingIdentifier => AppError::BadRequest(err.to_string()),
            ItemLookupError::NotFound(_) => AppError::NotFound("Item not found in NEU database".into()),
        }
    }
}

impl From<ScraperError> for AppError {
    fn from(err: ScraperError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

pub type AppResult<T> = Result<T, AppError>;
