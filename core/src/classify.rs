//! Failure classification.
//!
//! Turns arbitrary failure values (transport errors, HTTP error bodies,
//! plain strings) into [`IndexError`]s. Classification is pure and
//! idempotent: an already-classified error passes through untouched.
//!
//! The message-keyword table is deliberately private to this module;
//! upstream wording drift only ever touches this file, never call sites.

use docshelf_protocol::ErrorKind;
use serde_json::json;

use crate::error::IndexError;

/// Ordered keyword buckets; the first bucket containing a match wins.
/// Matching is case-insensitive substring search.
const MESSAGE_RULES: &[(ErrorKind, &[&str])] = &[
    (
        ErrorKind::FileTooLarge,
        &["too large", "file size", "size limit", "payload size"],
    ),
    (
        ErrorKind::UnsupportedFileType,
        &[
            "unsupported file",
            "unsupported mime",
            "invalid file type",
            "unsupported format",
        ],
    ),
    (
        ErrorKind::RateLimited,
        &[
            "rate limit",
            "quota",
            "resource exhausted",
            "too many requests",
        ],
    ),
    (
        ErrorKind::AuthFailed,
        &[
            "api key",
            "unauthorized",
            "unauthenticated",
            "authentication",
            "invalid credential",
        ],
    ),
    (
        ErrorKind::CollectionNotFound,
        &[
            "collection not found",
            "no such collection",
            "unknown collection",
        ],
    ),
    (
        ErrorKind::NetworkError,
        &[
            "timed out",
            "timeout",
            "network",
            "connection reset",
            "connection refused",
            "dns",
        ],
    ),
];

/// Select an [`ErrorKind`] from a failure message by keyword priority.
/// Falls back to [`ErrorKind::ApiError`] when nothing matches.
pub fn kind_for_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    for (kind, needles) in MESSAGE_RULES {
        if needles.iter().any(|needle| lower.contains(needle)) {
            return *kind;
        }
    }
    ErrorKind::ApiError
}

/// Status codes that warrant another attempt regardless of the classified
/// kind. Additive to kind-level retryability, never a replacement.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
}

/// Classify a non-success response from the index API.
///
/// The kind comes from message keywords first. When no keyword matches, a
/// handful of unambiguous statuses pick the kind; otherwise the caller's
/// `fallback` keeps the failure attributed to the operation that made the
/// call (upload, query, ...).
pub fn classify_response(status: u16, message: &str, fallback: ErrorKind) -> IndexError {
    let mut kind = kind_for_message(message);
    if kind == ErrorKind::ApiError {
        kind = match status {
            401 => ErrorKind::AuthFailed,
            403 => ErrorKind::CollectionAccessDenied,
            429 => ErrorKind::RateLimited,
            _ => fallback,
        };
    }
    let retryable = kind.default_retryable() || is_retryable_status(status);
    IndexError::new(kind, message)
        .with_retryable(retryable)
        .with_detail(json!({ "httpStatus": status }))
}

/// Conversion of arbitrary failure values into [`IndexError`].
///
/// The identity impl for `IndexError` is what makes classification
/// idempotent across retry attempts.
pub trait Classify {
    fn classify(self) -> IndexError;
}

impl Classify for IndexError {
    fn classify(self) -> IndexError {
        self
    }
}

impl Classify for reqwest::Error {
    fn classify(self) -> IndexError {
        let message = self.to_string();
        let kind = if self.is_decode() {
            // The service answered; we could not make sense of the body.
            ErrorKind::ApiError
        } else if self.is_timeout() || self.is_connect() {
            ErrorKind::NetworkError
        } else {
            match kind_for_message(&message) {
                ErrorKind::ApiError => ErrorKind::NetworkError,
                kind => kind,
            }
        };
        IndexError::new(kind, message).with_detail(json!({ "source": "http" }))
    }
}

impl Classify for serde_json::Error {
    fn classify(self) -> IndexError {
        IndexError::new(ErrorKind::ApiError, format!("malformed response: {self}"))
            .with_detail(json!({ "source": "decode" }))
    }
}

impl Classify for String {
    fn classify(self) -> IndexError {
        IndexError::unknown(self)
    }
}

impl Classify for &str {
    fn classify(self) -> IndexError {
        IndexError::unknown(self)
    }
}
