//! Classified operation errors.
//!
//! Every failure crossing the remote boundary is classified exactly once, at
//! the site that observed it, into an [`IndexError`]. From there it travels
//! unchanged to the caller; nothing re-wraps an already-classified error.

use docshelf_protocol::{ErrorKind, ErrorPayload};
use thiserror::Error;

/// Result alias used by every operation in this crate.
pub type OpResult<T> = Result<T, IndexError>;

/// A failure classified against the closed [`ErrorKind`] taxonomy.
///
/// `retryable` starts from the kind's default and may be overridden by the
/// producing site (e.g. a retryable HTTP status on a normally terminal
/// kind). Once constructed the error is immutable.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct IndexError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    pub detail: Option<serde_json::Value>,
}

impl IndexError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: kind.default_retryable(),
            detail: None,
        }
    }

    /// Override the kind-level retryability default.
    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn file_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FileNotFound, message)
    }

    pub fn collection_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CollectionNotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    /// Failure of no recognizable shape.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// Wire rendition consumed by the dispatch layer.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            error: true,
            error_code: self.kind,
            message: self.message.clone(),
            retryable: self.retryable,
            detail: self.detail.clone(),
        }
    }
}
