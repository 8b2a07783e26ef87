//! Unified error handling for the backend API.
//!
//! `ApiError` implements `IntoResponse` so JSON handlers can use `?` and still
//! answer with the right status code and a generic `{error}` body.
//! `AuthError` covers the login flow; the OAuth callback renders it as HTML
//! instead of JSON.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared_types::ErrorResponse;
use thiserror::Error;

/// Unified error type for JSON API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// No valid session cookie and no matching bypass header
    #[error("Unauthorized")]
    Unauthorized,

    /// The requested object does not exist
    #[error("{error}")]
    NotFound {
        error: String,
        message: Option<String>,
    },

    /// Anything else; `error` is the generic text sent to the client
    #[error("{error}: {source}")]
    Internal {
        error: String,
        #[source]
        source: anyhow::Error,
    },

    /// Required configuration is missing
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Create a not found error with a custom message
    pub fn not_found(error: impl Into<String>) -> Self {
        ApiError::NotFound {
            error: error.into(),
            message: None,
        }
    }

    /// Create an internal error that hides `source` from the client
    pub fn internal(error: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal {
            error: error.into(),
            source: source.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, ErrorResponse::new("Unauthorized")),
            ApiError::NotFound { error, message } => {
                let body = match message {
                    Some(message) => ErrorResponse::new(error).with_message(message),
                    None => ErrorResponse::new(error),
                };
                (StatusCode::NOT_FOUND, body)
            }
            ApiError::Internal { error, source } => {
                tracing::error!("{}: {:?}", error, source);
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(error))
            }
            ApiError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Server configuration error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures of the login flow (code exchange, allow-list, minting).
#[derive(Debug, Error)]
pub enum AuthError {
    /// `SESSION_SECRET` is not configured; never fall back to a default key
    #[error("SESSION_SECRET not configured")]
    MissingSecret,

    #[error("GOOGLE_CLIENT_ID not configured")]
    MissingClientId,

    /// The identity provider answered with an error or could not be reached
    #[error("{0}")]
    Provider(String),

    #[error("No email received from Google")]
    MissingEmail,

    /// Valid provider login whose email is not on the allow-list
    #[error("{0} is not on the allow-list")]
    NotAllowed(String),

    /// The callback request itself is unusable (provider error, missing code)
    #[error("{0}")]
    InvalidRequest(String),

    /// Session lifetime does not fit in a timestamp
    #[error("Session lifetime of {0} seconds is out of range")]
    InvalidTtl(i64),

    #[error("Failed to encode session: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl AuthError {
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AuthError::MissingSecret | AuthError::MissingClientId | AuthError::InvalidTtl(_)
        )
    }
}
