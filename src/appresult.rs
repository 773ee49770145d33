use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::res;

pub type AppResult<T> = Result<T, AppError>;

/// Every failure the core can report. Validation and lookup failures are
/// expected outcomes; only `Internal` is an actual fault.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("{0}")]
    NotFound(String),

    /// The database stayed locked past the busy timeout.
    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation(_) | InvalidTimezone(_) => StatusCode::BAD_REQUEST,
            NotFound(_) => StatusCode::NOT_FOUND,
            Conflict(_) => StatusCode::CONFLICT,
            Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                "Internal Server Error".to_owned()
            }
            other => {
                tracing::debug!(%status, message = %other, "request rejected");
                other.to_string()
            }
        };

        res::failure(status, message)
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Internal(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(serde_json::Error);
apperr_impl!(tower_sessions::session::Error);

// SQLITE_BUSY, SQLITE_LOCKED and their extended codes
const LOCKED_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().is_some_and(|code| LOCKED_CODES.contains(&&*code)) {
                return Self::Conflict("Database is busy, try again".to_owned());
            }
        }
        Self::Internal(anyhow::Error::from(err))
    }
}

macro_rules! rejection_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(rejection: $E) -> Self {
                Self::Validation(rejection.body_text())
            }
        }
    };
}

rejection_impl!(JsonRejection);
rejection_impl!(PathRejection);
rejection_impl!(QueryRejection);
