// src/error.rs
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Failures reported by a persistence port.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Database(#[from] sqlx::Error),
}

/// Every failure a pipeline step can produce. The message is what the caller sees.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MalformedPayload(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    NotChangePoll(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Storage(String),
}

/// How the boundary reports a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Forbidden,
    BadRequest,
    Conflict,
}

impl Classification {
    pub fn status(self) -> StatusCode {
        match self {
            Classification::Forbidden => StatusCode::FORBIDDEN,
            Classification::BadRequest => StatusCode::BAD_REQUEST,
            Classification::Conflict => StatusCode::CONFLICT,
        }
    }
}

impl AppError {
    pub fn classification(&self) -> Classification {
        match self {
            AppError::Unauthenticated(_) => Classification::Forbidden,
            AppError::MalformedPayload(_) => Classification::BadRequest,
            AppError::InvalidInput(_)
            | AppError::NotFound(_)
            | AppError::NotChangePoll(_)
            | AppError::Conflict(_)
            | AppError::Storage(_) => Classification::Conflict,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(message) => AppError::NotFound(message),
            StoreError::Database(e) => AppError::Storage(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.classification().status();

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
