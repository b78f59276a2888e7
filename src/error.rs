use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure of the durable storage underneath the clipboard store or the
/// upload directory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking storage task panicked or was cancelled.
    #[error("storage task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors returned by the clipboard store and the file directory.
///
/// `InvalidInput`, `NotFound` and `Unauthorized` are expected, user-facing
/// outcomes. `Storage` is an infrastructure failure and is never retried.
#[derive(Debug, Error)]
pub enum ShareError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ShareError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for ShareError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.into())
    }
}

impl From<r2d2::Error> for ShareError {
    fn from(e: r2d2::Error) -> Self {
        Self::Storage(e.into())
    }
}

impl From<std::io::Error> for ShareError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.into())
    }
}

impl From<tokio::task::JoinError> for ShareError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Storage(e.into())
    }
}

impl IntoResponse for ShareError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let Self::Storage(e) = &self {
            tracing::error!(error = %e, "storage failure");
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T, E = ShareError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_category() {
        assert_eq!(ShareError::invalid("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ShareError::NotFound("a.txt".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ShareError::Unauthorized("bad password".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        let io = std::io::Error::other("disk gone");
        assert_eq!(
            ShareError::from(io).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn message_names_the_category() {
        let err = ShareError::invalid("context is required");
        assert_eq!(err.to_string(), "invalid input: context is required");
    }
}
