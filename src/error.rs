use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("Invalid or expired token")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation {
        message: String,
        fields: HashMap<String, String>,
    },

    // Domain-rule violation, e.g. a voucher outside its validity window.
    #[error("{0}")]
    Invalid(String),

    #[error("Database error")]
    Db(#[from] sqlx::Error),

    #[error("Database error")]
    Orm(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<HashMap<String, String>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "Validation Error"),
            AppError::Invalid(_) => (StatusCode::BAD_REQUEST, "Invalid"),
            AppError::Db(_) | AppError::Orm(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };

        let fields = match &self {
            AppError::Validation { fields, .. } if !fields.is_empty() => Some(fields.clone()),
            _ => None,
        };

        let body = ErrorBody {
            error: kind,
            message: self.to_string(),
            fields,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl AppError {
    pub fn validation(message: impl Into<String>, field: &str, reason: &str) -> Self {
        AppError::Validation {
            message: message.into(),
            fields: HashMap::from([(field.to_string(), reason.to_string())]),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
