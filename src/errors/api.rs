use super::*;
use anyhow::anyhow;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as TError;
use tracing::error;

#[derive(TError, Debug)]
pub enum ApiError {
    // -------- Infra --------
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    // -------- Domain --------
    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("{0}")]
    MethodNotAllowed(String),

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    BadRequest(anyhow::Error),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(DatabaseError::Connection(e))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(anyhow!(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(anyhow!(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // ---------- Database ----------
            ApiError::Database(db) => match db {
                DatabaseError::NotFound(_) => StatusCode::NOT_FOUND,
                DatabaseError::Duplicate(_) => StatusCode::CONFLICT,
                DatabaseError::PoolNotInitialized
                | DatabaseError::PoolAlreadyInitialized
                | DatabaseError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
                DatabaseError::Migration(_) | DatabaseError::InvalidRecord(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // ---------- Domain ----------
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // infra failures are logged, never echoed back
        let detail = if status.is_server_error() {
            error!(error = ?self, "request failed");
            "Internal server error.".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
