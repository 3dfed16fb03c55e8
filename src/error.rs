use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Flipped off at startup when APP_ENV=production.
static EXPOSE_DETAILS: AtomicBool = AtomicBool::new(true);

pub fn expose_internal_details(expose: bool) {
    EXPOSE_DETAILS.store(expose, Ordering::Relaxed);
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Permission(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Authentication(String),

    #[error("Email not confirmed")]
    EmailNotConfirmed,

    #[error("Upstream service failed: {0}")]
    Upstream(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn permission(message: impl Into<String>) -> Self {
        AppError::Permission(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        AppError::Authentication(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        AppError::NotFound { entity, id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Permission(_) => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Authentication(_) | AppError::EmailNotConfirmed => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::Permission(_) => "permission_denied",
            AppError::NotFound { .. } => "not_found",
            AppError::Authentication(_) => "authentication_failed",
            AppError::EmailNotConfirmed => "email_not_confirmed",
            AppError::Upstream(_) => "upstream_error",
            AppError::Database(_) => "database_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            error!("Request failed: {}", self);
            let mut body = json!({
                "error": self.code(),
                "message": "Internal server error",
            });
            if EXPOSE_DETAILS.load(Ordering::Relaxed) {
                body["detail"] = json!(self.to_string());
            }
            body
        } else {
            json!({
                "error": self.code(),
                "message": self.to_string(),
            })
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}
