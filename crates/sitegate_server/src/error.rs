//! Error types for the server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
///
/// Client errors carry their display text to the caller. Server errors are
/// logged and reported as a generic `Server error`.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Request body is not valid JSON for the endpoint.
    #[error("Malformed request body")]
    MalformedBody,

    /// Registration without email or password.
    #[error("Email and password required")]
    MissingCredentials,

    /// Registration for an email that already has an account.
    #[error("User already exists")]
    UserExists,

    /// Unknown user or wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No valid session cookie.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The backend does not accept new accounts.
    #[error("Registration is disabled")]
    RegistrationDisabled,

    /// CSRF cookie and header missing or mismatched.
    #[error("Invalid CSRF token")]
    CsrfRejected,

    /// Persistent store failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// Returns the HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::MalformedBody | ServerError::MissingCredentials => {
                StatusCode::BAD_REQUEST
            }
            ServerError::UserExists => StatusCode::CONFLICT,
            ServerError::InvalidCredentials | ServerError::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            ServerError::RegistrationDisabled | ServerError::CsrfRejected => {
                StatusCode::FORBIDDEN
            }
            ServerError::Storage(_)
            | ServerError::Internal(_)
            | ServerError::Io(_)
            | ServerError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status().is_server_error()
    }
}

/// JSON error body: `{ "error": "..." }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_server_error() {
            error!("request failed: {}", self);
            "Server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
