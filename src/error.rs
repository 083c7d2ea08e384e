//! Error types for the feed service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Storage-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store could not be opened or initialised, or has been closed.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Store operation cancelled: {0}")]
    Cancelled(String),

    #[error("Migration failed: {0}")]
    Migration(String),
}

/// Failure to emit page output.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to write page {stage}")]
    Write { stage: &'static str },
}

/// Which write path failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOperation {
    Add,
    Delete,
}

impl WriteOperation {
    /// The fixed, user-visible message for a failed write.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Add => "Failed to add the post",
            Self::Delete => "Failed to remove the post",
        }
    }
}

/// Errors surfaced by the feed service operations.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{}: {source}", .operation.failure_message())]
    WriteFailed {
        operation: WriteOperation,
        #[source]
        source: StoreError,
    },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::WriteFailed { operation, source } => {
                tracing::error!(operation = ?operation, error = %source, "Write failed");
                operation.failure_message()
            }
            Self::Store(err) => {
                tracing::error!(error = %err, "Feed query failed");
                "Failed to load the feed"
            }
            Self::Render(err) => {
                tracing::error!(error = %err, "Feed render failed");
                "Failed to load the feed"
            }
        };

        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}
