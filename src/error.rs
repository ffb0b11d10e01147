//! Error type shared by the API client, view model and command handlers.

use thiserror::Error;

/// Everything that can go wrong while talking to the board service or
/// touching local files.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad credentials, an expired token, or no stored session at all.
    #[error("not authenticated: {0}")]
    Unauthorized(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure (connection refused, TLS, decode).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// An id that the local state does not know about.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn not_found(kind: &'static str, id: i64) -> Self {
        AppError::NotFound { kind, id }
    }

    /// Whether the user has to log in again before retrying.
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
