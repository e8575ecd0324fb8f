//! REST API module for HTTP endpoints
//!
//! - `GET /health` - Relay liveness and connection counts
//! - `POST /api/register` - Create an account and assign a group
//! - `POST /api/login` - Exchange credentials for a session token
//! - `GET /api/me` - Profile of the token holder
//! - `GET /api/groups` - Group distribution report

pub mod health;
pub mod registration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::registration::{RegistrationError, SessionError};

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, code: &str) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, "NOT_FOUND")
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, "BAD_REQUEST")
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, "UNAUTHORIZED")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(message, "INTERNAL_ERROR")
    }
}

/// Build an error response with the given status
pub fn error_response(status: StatusCode, error: ApiError) -> Response {
    (status, Json(error)).into_response()
}

/// Map a registration failure onto a status code
pub fn registration_error(err: RegistrationError) -> Response {
    let message = err.to_string();
    let (status, error) = match err {
        RegistrationError::MissingFields | RegistrationError::PasswordMismatch => {
            (StatusCode::BAD_REQUEST, ApiError::bad_request(message))
        }
        RegistrationError::EmailTaken => (StatusCode::CONFLICT, ApiError::new(message, "EMAIL_TAKEN")),
        RegistrationError::RegistrationClosed => (
            StatusCode::SERVICE_UNAVAILABLE,
            ApiError::new(message, "REGISTRATION_CLOSED"),
        ),
        RegistrationError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, ApiError::unauthorized(message))
        }
        RegistrationError::Hash(_) => (StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal(message)),
    };
    error_response(status, error)
}

/// Map a token failure onto a status code
pub fn session_error(err: SessionError) -> Response {
    let message = err.to_string();
    match err {
        SessionError::InvalidSecret(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, ApiError::internal(message))
        }
        _ => error_response(StatusCode::UNAUTHORIZED, ApiError::unauthorized(message)),
    }
}
