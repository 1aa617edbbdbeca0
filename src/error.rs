// Stockroom - Error taxonomy
// Store-level failures plus the boundary error type they roll up into

use thiserror::Error;

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached: the process-wide handle was never
    /// initialized, the connection could not be opened, the connection lock
    /// is poisoned, or a query timed out.
    #[error("persistence engine unavailable: {0}")]
    Unavailable(String),

    /// Any other read or write failure, including row conversion.
    #[error("persistence query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Errors caught at the HTTP boundary.
///
/// Every variant is translated into a `{"error": "<message>"}` body with a
/// generic, human-readable message. The full error chain goes to the log,
/// never to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The requested enumeration does not exist. A programming error rather
    /// than a client error: known callers only pass compile-time names.
    #[error("unknown enumeration `{0}`")]
    UnknownEnumeration(String),

    /// Login rejected: no such user, or the password did not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No live session token accompanied the request.
    #[error("not authenticated")]
    Unauthenticated,
}

#[cfg(feature = "server")]
mod http {
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use tracing::error;

    use super::{ApiError, StoreError};
    use crate::api::ErrorBody;

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            let (status, message) = match &self {
                ApiError::Store(StoreError::Unavailable(detail)) => {
                    error!("store unavailable: {detail}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Service temporarily unavailable",
                    )
                }
                ApiError::Store(StoreError::Query(detail)) => {
                    error!("store query failed: {detail}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load data")
                }
                ApiError::UnknownEnumeration(name) => {
                    error!("unknown enumeration requested: `{name}`");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
                }
                ApiError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid username or password")
                }
                ApiError::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            };

            (
                status,
                Json(ErrorBody {
                    error: message.to_string(),
                }),
            )
                .into_response()
        }
    }
}
