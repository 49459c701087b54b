//! Classified-failure vocabulary.
//!
//! Every failed tool call is rendered as an [`ErrorPayload`] carrying one of
//! the closed [`ErrorKind`] codes plus the retryability verdict, so callers
//! can decide between retrying at their own level and surfacing the failure
//! as terminal.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed set of failure categories.
///
/// Serialized as SCREAMING_SNAKE_CASE codes; these strings are the wire
/// `errorCode` values and are load-bearing for callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    FileTooLarge,
    UnsupportedFileType,
    FileNotFound,
    UploadFailed,
    DownloadFailed,
    IndexingTimeout,
    IndexingFailed,
    QueryFailed,
    CollectionNotFound,
    CollectionAccessDenied,
    RateLimited,
    ApiError,
    AuthFailed,
    ValidationFailed,
    InvalidInput,
    NetworkError,
    Unknown,
}

impl ErrorKind {
    /// Stable wire code for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::FileTooLarge => "FILE_TOO_LARGE",
            ErrorKind::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            ErrorKind::FileNotFound => "FILE_NOT_FOUND",
            ErrorKind::UploadFailed => "UPLOAD_FAILED",
            ErrorKind::DownloadFailed => "DOWNLOAD_FAILED",
            ErrorKind::IndexingTimeout => "INDEXING_TIMEOUT",
            ErrorKind::IndexingFailed => "INDEXING_FAILED",
            ErrorKind::QueryFailed => "QUERY_FAILED",
            ErrorKind::CollectionNotFound => "COLLECTION_NOT_FOUND",
            ErrorKind::CollectionAccessDenied => "COLLECTION_ACCESS_DENIED",
            ErrorKind::RateLimited => "RATE_LIMITED",
            ErrorKind::ApiError => "API_ERROR",
            ErrorKind::AuthFailed => "AUTH_FAILED",
            ErrorKind::ValidationFailed => "VALIDATION_FAILED",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::NetworkError => "NETWORK_ERROR",
            ErrorKind::Unknown => "UNKNOWN",
        }
    }

    /// Whether a failure of this kind may succeed if attempted again with
    /// unchanged inputs. Producing sites can override per error; this is the
    /// kind-level default.
    pub fn default_retryable(self) -> bool {
        match self {
            ErrorKind::UploadFailed
            | ErrorKind::DownloadFailed
            | ErrorKind::IndexingTimeout
            | ErrorKind::QueryFailed
            | ErrorKind::RateLimited
            | ErrorKind::NetworkError => true,
            ErrorKind::FileTooLarge
            | ErrorKind::UnsupportedFileType
            | ErrorKind::FileNotFound
            | ErrorKind::IndexingFailed
            | ErrorKind::CollectionNotFound
            | ErrorKind::CollectionAccessDenied
            | ErrorKind::ApiError
            | ErrorKind::AuthFailed
            | ErrorKind::ValidationFailed
            | ErrorKind::InvalidInput
            | ErrorKind::Unknown => false,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape of a failed tool call.
///
/// Returned as the JSON-RPC *result* of `tools.call`; tool failures are
/// data for the calling agent, not protocol errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    /// Always `true`; lets callers distinguish failure payloads from
    /// success payloads without inspecting the schema.
    pub error: bool,
    pub error_code: ErrorKind,
    pub message: String,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}
