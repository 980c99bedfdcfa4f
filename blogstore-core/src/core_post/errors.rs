//! Error types for post operations and the storage substrate

use super::types::{PostId, UserId};
use thiserror::Error;

/// Error taxonomy shared by every post operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    Conflict,
    InvalidInput,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Storage => "storage",
        }
    }
}

/// Post operation errors
#[derive(Debug, Error)]
pub enum PostError {
    #[error("key {0} doesn't exist")]
    NotFound(PostId),

    #[error("editor {editor} does not exist on post {post_id}")]
    EditorNotFound { post_id: PostId, editor: UserId },

    #[error("{0}: unauthorized")]
    Unauthorized(String),

    #[error("{0}: conflict")]
    Conflict(String),

    #[error("{0}: invalid input")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PostError {
    /// Map to the error taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            PostError::NotFound(_) | PostError::EditorNotFound { .. } => ErrorKind::NotFound,
            PostError::Unauthorized(_) => ErrorKind::Unauthorized,
            PostError::Conflict(_) => ErrorKind::Conflict,
            PostError::InvalidInput(_) => ErrorKind::InvalidInput,
            PostError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        PostError::Unauthorized(reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        PostError::Conflict(reason.into())
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        PostError::InvalidInput(reason.into())
    }
}

/// Result type for post operations
pub type PostResult<T> = Result<T, PostError>;

/// Errors raised by a storage substrate
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Post {0} already exists")]
    DuplicatePost(PostId),

    #[error("Corrupted data: {0}")]
    Corrupted(String),

    /// Raised by backends configured to fail, used to exercise abort paths
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
