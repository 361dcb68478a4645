//! Custom error types for the catalog service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the catalog service
#[derive(Error, Debug)]
pub enum WebError {
    /// No active session
    #[error("Unauthorized")]
    Unauthorized,

    /// Active session without the required role
    #[error("Forbidden")]
    Forbidden,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rejected login or registration form
    #[error("{0}")]
    Form(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] common::error::DatabaseError),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            WebError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({"error": "Unauthorized"})),
            WebError::Forbidden => (StatusCode::FORBIDDEN, json!({"error": "Forbidden"})),
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({"error": msg})),
            WebError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({"error": msg})),
            WebError::Form(msg) => (StatusCode::BAD_REQUEST, json!({"errorMessage": msg})),
            WebError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Internal server error"}),
            ),
            WebError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Database error"}),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for handler results
pub type WebResult<T> = Result<T, WebError>;
