use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde_json::{Value, json};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::response::{ApiResponse, ErrorCode};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),

    #[error("Bad Request {0}")]
    BadRequest(String),

    /// The request could not be read into the handler's inputs.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Insufficient stock for variant {variant_id}")]
    InsufficientStock { variant_id: Uuid },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Storage error")]
    Storage(#[from] std::io::Error),

    #[error("ORM error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation(_)
            | AppError::BadRequest(_)
            | AppError::InsufficientStock { .. } => ErrorCode::ValidationError,
            AppError::Rejected { status, .. } if status.is_server_error() => {
                ErrorCode::InternalError
            }
            AppError::Rejected { .. } => ErrorCode::ValidationError,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::UploadFailed(_) => ErrorCode::UploadFailed,
            AppError::Storage(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                ErrorCode::InternalError
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        if let AppError::Rejected { status, .. } = self {
            return *status;
        }
        match self.code() {
            ErrorCode::ValidationError | ErrorCode::UploadFailed => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turns a unique-constraint violation reported by the database into a
    /// `Conflict` with the given message; every other error passes through.
    pub fn on_unique_violation(self, message: &str) -> AppError {
        match self {
            AppError::OrmError(err) if is_unique_violation(&err) => {
                AppError::Conflict(message.to_string())
            }
            other => other,
        }
    }

    fn data(&self) -> Option<Value> {
        match self {
            AppError::Validation(errors) => Some(json!({ "errors": errors })),
            AppError::InsufficientStock { variant_id } => Some(json!({ "variant_id": variant_id })),
            _ => None,
        }
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Unique violation whose message mentions `column`.
pub fn is_unique_violation_on(err: &DbErr, column: &str) -> bool {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => message.contains(column),
        _ => false,
    }
}

macro_rules! rejection_into_app_error {
    ($($rejection:ty),+ $(,)?) => {
        $(
            impl From<$rejection> for AppError {
                fn from(rejection: $rejection) -> Self {
                    AppError::Rejected {
                        status: rejection.status(),
                        message: rejection.body_text(),
                    }
                }
            }
        )+
    };
}

rejection_into_app_error!(
    JsonRejection,
    PathRejection,
    QueryRejection,
    MultipartRejection,
    MultipartError,
);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse::failure(self.to_string(), self.code(), self.data());
        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
