//! HTTP client for the remote index API.
//!
//! One method per endpoint, one attempt per call; the operations layer is
//! responsible for wrapping calls in the retry executor. Non-success
//! responses are drained to text and decoded as the service error envelope
//! `{"error": {"code", "message", "status"}}` before classification, so the
//! classifier sees the service's own wording.

use base64::{Engine, engine::general_purpose::STANDARD};
use docshelf_protocol::ErrorKind;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::classify::{self, Classify};
use crate::config::Config;
use crate::error::{IndexError, OpResult};

/// Bounded page size for list calls. One page is the candidate window for
/// listing and search; documents beyond it are not considered.
pub const LIST_PAGE_SIZE: u32 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Remote resource shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Indexing state the service reports on a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    #[default]
    Active,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFileError {
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub uri: String,
    pub mime_type: String,
    pub display_name: String,
    #[serde(default)]
    pub size_bytes: u64,
    #[serde(default)]
    pub create_time: Option<String>,
    #[serde(default)]
    pub state: FileState,
    /// Present when `state` is `failed`.
    #[serde(default)]
    pub error: Option<RemoteFileError>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCollection {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
struct FileEnvelope {
    file: RemoteFile,
}

#[derive(Debug, Deserialize)]
struct FileListEnvelope {
    #[serde(default)]
    files: Vec<RemoteFile>,
}

#[derive(Debug, Deserialize)]
struct CollectionEnvelope {
    collection: RemoteCollection,
}

#[derive(Debug, Deserialize)]
struct CollectionListEnvelope {
    #[serde(default)]
    collections: Vec<RemoteCollection>,
}

#[derive(Debug, Deserialize)]
struct GenerateEnvelope {
    text: String,
}

/// Tolerant target for endpoints whose success body carries nothing.
#[derive(Debug, Deserialize)]
struct EmptyBody {}

/// Service error envelope.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    code: Option<u16>,
    message: String,
    status: Option<String>,
}

/// Payload for `upload_file`.
#[derive(Debug)]
pub struct UploadRequest<'a> {
    pub collection_id: &'a str,
    pub display_name: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
    /// Advisory duplicate-detection hint; stored, not enforced.
    pub dedupe_key: Option<&'a str>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

pub struct IndexClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl IndexClient {
    pub fn new(config: &Config) -> OpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("docshelf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Classify::classify)?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn upload_file(&self, request: &UploadRequest<'_>) -> OpResult<RemoteFile> {
        let mut body = json!({
            "collectionId": request.collection_id,
            "displayName": request.display_name,
            "mimeType": request.mime_type,
            "sizeBytes": request.bytes.len() as u64,
            "content": STANDARD.encode(request.bytes),
        });
        if let Some(key) = request.dedupe_key {
            body["dedupeKey"] = json!(key);
        }
        let builder = self.request(Method::POST, "/v1/files").json(&body);
        let envelope: FileEnvelope = self.execute(builder, ErrorKind::UploadFailed, None).await?;
        Ok(envelope.file)
    }

    pub async fn list_files(&self, collection_id: &str) -> OpResult<Vec<RemoteFile>> {
        let builder = self.request(
            Method::GET,
            &format!("/v1/files?pageSize={LIST_PAGE_SIZE}&collectionId={collection_id}"),
        );
        let envelope: FileListEnvelope = self.execute(builder, ErrorKind::ApiError, None).await?;
        Ok(envelope.files)
    }

    pub async fn get_file(&self, id: &str) -> OpResult<RemoteFile> {
        let builder = self.request(Method::GET, &format!("/v1/files/{id}"));
        let not_found = format!("document {id} not found");
        let envelope: FileEnvelope = self
            .execute(builder, ErrorKind::ApiError, Some(not_found))
            .await?;
        Ok(envelope.file)
    }

    pub async fn delete_file(&self, id: &str) -> OpResult<()> {
        let builder = self.request(Method::DELETE, &format!("/v1/files/{id}"));
        let not_found = format!("document {id} not found");
        let _: EmptyBody = self
            .execute(builder, ErrorKind::ApiError, Some(not_found))
            .await?;
        Ok(())
    }

    pub async fn list_collections(&self) -> OpResult<Vec<RemoteCollection>> {
        let builder = self.request(
            Method::GET,
            &format!("/v1/collections?pageSize={LIST_PAGE_SIZE}"),
        );
        let envelope: CollectionListEnvelope =
            self.execute(builder, ErrorKind::ApiError, None).await?;
        Ok(envelope.collections)
    }

    pub async fn create_collection(&self, display_name: &str) -> OpResult<RemoteCollection> {
        let body = json!({ "displayName": display_name });
        let builder = self.request(Method::POST, "/v1/collections").json(&body);
        let envelope: CollectionEnvelope = self.execute(builder, ErrorKind::ApiError, None).await?;
        Ok(envelope.collection)
    }

    /// Grounded generation over previously uploaded files; the service
    /// answers with plain text the caller is expected to parse.
    pub async fn generate(&self, prompt: &str, file_uris: &[String]) -> OpResult<String> {
        let body = json!({
            "prompt": prompt,
            "files": file_uris,
        });
        let builder = self.request(Method::POST, "/v1/generate").json(&body);
        let envelope: GenerateEnvelope = self.execute(builder, ErrorKind::QueryFailed, None).await?;
        Ok(envelope.text)
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        builder
    }

    /// Send, drain, and decode. `not_found` maps an HTTP 404 to
    /// FILE_NOT_FOUND with the given message; other non-success responses go
    /// through the error envelope and the classifier.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        fallback: ErrorKind,
        not_found: Option<String>,
    ) -> OpResult<T> {
        let response = builder.send().await.map_err(Classify::classify)?;
        let status = response.status();
        if status.as_u16() == 404
            && let Some(message) = not_found
        {
            return Err(IndexError::file_not_found(message));
        }
        let text = response.text().await.map_err(Classify::classify)?;
        if !status.is_success() {
            return Err(decode_error(status.as_u16(), &text, fallback));
        }
        serde_json::from_str(&text).map_err(Classify::classify)
    }
}

fn decode_error(status: u16, body: &str, fallback: ErrorKind) -> IndexError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(envelope) => {
            let code = envelope.error.code.unwrap_or(status);
            let err = classify::classify_response(code, &envelope.error.message, fallback);
            match envelope.error.status {
                Some(name) => err.with_detail(json!({ "httpStatus": code, "status": name })),
                None => err,
            }
        }
        Err(_) => {
            let trimmed = body.trim();
            let message = if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_string()
            };
            classify::classify_response(status, &message, fallback)
        }
    }
}
