//! Typed errors and HTTP mapping.
//!
//! Every fault that reaches the request layer is rendered as
//! `{status: 2, errorCode, error}`, the shape the error normalization layer
//! emits for validation faults. The listing engine
//! handles its own failures and never raises through here; these mappings
//! cover auth, validation, and unexpected store faults from the surrounding
//! plumbing.

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing env var: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Forbidden")]
    Unauthorized,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    fn error_code(&self) -> u16 {
        match self {
            AppError::Unauthorized => 401,
            AppError::NotFound(_) => 404,
            AppError::Validation(_) | AppError::BadRequest(_) => 400,
            AppError::Store(_) => 500,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.error_code();
        // store faults are logged, never leaked to the caller
        let message = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "unexpected store fault");
                "Unexpected error occured".to_string()
            }
            other => other.to_string(),
        };
        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "status": 2,
            "errorCode": code,
            "error": message,
        });
        (status, Json(body)).into_response()
    }
}
