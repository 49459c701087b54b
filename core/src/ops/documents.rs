//! Document ingestion, listing, and deletion.

use std::path::{Path, PathBuf};
use std::time::Instant;

use docshelf_protocol::{
    AddDocumentParams, AddDocumentResult, DeleteDocumentParams, DeleteDocumentResult,
    DocumentMetadata, ErrorKind, ListDocumentsParams, ListDocumentsResult,
};
use serde_json::json;
use tempfile::NamedTempFile;
use url::Url;

use super::{Ops, apply_filters, document_info};
use crate::classify::{self, Classify};
use crate::client::{FileState, UploadRequest};
use crate::error::{IndexError, OpResult};
use crate::fingerprint;
use crate::retry::retry_remote;

/// MIME types the index service can ingest.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "text/markdown",
    "text/html",
    "text/csv",
    "application/json",
    "text/xml",
    "application/xml",
];

const DEFAULT_PAGE_SIZE: u32 = 20;

enum SourceKind {
    Remote(Url),
    Local(PathBuf),
}

fn parse_source(source: &str) -> SourceKind {
    if let Ok(url) = Url::parse(source)
        && matches!(url.scheme(), "http" | "https")
    {
        return SourceKind::Remote(url);
    }
    SourceKind::Local(PathBuf::from(source))
}

impl Ops {
    /// Upload one document into the active collection.
    ///
    /// `source` is a local path or an http(s) URL; URLs are staged through a
    /// temp file so both branches share the local flow. All local
    /// preconditions (existence, size cap, supported type) are checked
    /// before any index-API call.
    pub async fn add_document(&self, params: AddDocumentParams) -> OpResult<AddDocumentResult> {
        let start = Instant::now();
        let metadata = params.metadata.unwrap_or_default();

        let (path, staged, source_name) = match parse_source(&params.source) {
            SourceKind::Remote(url) => {
                let name = file_name_from_url(&url);
                let temp = download_to_temp(&url).await?;
                (temp.path().to_path_buf(), Some(temp), name)
            }
            SourceKind::Local(path) => {
                if !path.is_file() {
                    return Err(IndexError::file_not_found(format!(
                        "no such file: {}",
                        path.display()
                    )));
                }
                let name = file_name_from_path(&path);
                (path, None, name)
            }
        };

        let bytes = tokio::fs::read(&path).await.map_err(|err| {
            IndexError::new(
                ErrorKind::FileNotFound,
                format!("cannot read {}: {err}", path.display()),
            )
        })?;

        if bytes.len() as u64 > self.config.max_file_bytes {
            return Err(IndexError::new(
                ErrorKind::FileTooLarge,
                format!(
                    "file is {} bytes, the cap is {}",
                    bytes.len(),
                    self.config.max_file_bytes
                ),
            ));
        }

        let mime_type = resolve_mime(&metadata, &source_name)?;
        let print = fingerprint::derive(&bytes, Some(&metadata));
        let collection_id = self.resolver.resolve().await?;

        let display_name = metadata.title.unwrap_or(source_name);

        let request = UploadRequest {
            collection_id: &collection_id,
            display_name: &display_name,
            mime_type: &mime_type,
            bytes: &bytes,
            dedupe_key: Some(&print.dedupe_key),
        };
        let uploaded = retry_remote("files.upload", || self.client.upload_file(&request)).await?;

        // The staging file has served its purpose; losing it is not worth
        // failing a successful upload over.
        if let Some(temp) = staged {
            let temp_path = temp.path().to_path_buf();
            if let Err(err) = temp.close() {
                tracing::warn!("could not remove staging file {}: {err}", temp_path.display());
            }
        }

        if uploaded.state == FileState::Failed {
            let reason = uploaded
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "indexing failed".to_string());
            let lower = reason.to_lowercase();
            let kind = if lower.contains("timeout") || lower.contains("timed out") {
                ErrorKind::IndexingTimeout
            } else {
                ErrorKind::IndexingFailed
            };
            return Err(IndexError::new(kind, reason).with_detail(json!({ "docId": uploaded.id })));
        }

        tracing::info!(
            doc_id = %uploaded.id,
            size_bytes = bytes.len(),
            mime = %mime_type,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "added document"
        );
        Ok(AddDocumentResult {
            document: document_info(uploaded),
            fingerprint: print,
            collection_id,
        })
    }

    /// List documents in the active collection, newest first, paginated
    /// locally over one bounded remote page.
    pub async fn list_documents(
        &self,
        params: ListDocumentsParams,
    ) -> OpResult<ListDocumentsResult> {
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

        let collection_id = self.resolver.resolve().await?;
        let files = retry_remote("files.list", || self.client.list_files(&collection_id)).await?;
        let mut files = apply_filters(files, params.filters.as_ref());
        files.sort_by(|a, b| {
            b.create_time
                .cmp(&a.create_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = files.len() as u64;
        let start = ((page - 1) as usize).saturating_mul(page_size as usize);
        let documents: Vec<_> = files
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .map(document_info)
            .collect();
        let has_more = (start + documents.len()) < total as usize;

        tracing::debug!(total, page, returned = documents.len(), "listed documents");
        Ok(ListDocumentsResult {
            documents,
            page,
            page_size,
            total,
            has_more,
        })
    }

    pub async fn delete_document(
        &self,
        params: DeleteDocumentParams,
    ) -> OpResult<DeleteDocumentResult> {
        retry_remote("files.delete", || self.client.delete_file(&params.doc_id)).await?;
        tracing::info!(doc_id = %params.doc_id, "deleted document");
        Ok(DeleteDocumentResult {
            doc_id: params.doc_id,
            deleted: true,
        })
    }
}

/// Download a source URL into a temp file.
///
/// Uses a dedicated HTTP client so the index-API credential never leaks to
/// arbitrary download hosts.
async fn download_to_temp(url: &Url) -> OpResult<NamedTempFile> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("docshelf/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Classify::classify)?;

    let bytes = retry_remote("source.download", || {
        let http = http.clone();
        let url = url.clone();
        async move {
            let response = http.get(url).send().await.map_err(Classify::classify)?;
            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = if body.trim().is_empty() {
                    format!("download failed with HTTP {status}")
                } else {
                    body.trim().to_string()
                };
                return Err(classify::classify_response(
                    status.as_u16(),
                    &message,
                    ErrorKind::DownloadFailed,
                ));
            }
            response.bytes().await.map_err(Classify::classify)
        }
    })
    .await?;

    let temp = tempfile::Builder::new()
        .prefix("docshelf-")
        .tempfile()
        .map_err(|err| stage_error("create", err))?;
    tokio::fs::write(temp.path(), &bytes)
        .await
        .map_err(|err| stage_error("write", err))?;
    Ok(temp)
}

fn stage_error(action: &str, err: std::io::Error) -> IndexError {
    IndexError::new(
        ErrorKind::DownloadFailed,
        format!("could not {action} staging file: {err}"),
    )
    .with_retryable(false)
}

fn file_name_from_url(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("download")
        .to_string()
}

fn file_name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

fn resolve_mime(metadata: &DocumentMetadata, file_name: &str) -> OpResult<String> {
    let mime = match &metadata.mime_type {
        Some(explicit) => explicit.clone(),
        None => mime_guess::from_path(file_name)
            .first_raw()
            .map(str::to_string)
            .ok_or_else(|| {
                IndexError::new(
                    ErrorKind::UnsupportedFileType,
                    format!("cannot determine the file type of '{file_name}'"),
                )
            })?,
    };
    if !ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        return Err(IndexError::new(
            ErrorKind::UnsupportedFileType,
            format!("unsupported file type '{mime}'"),
        )
        .with_detail(json!({ "allowed": ALLOWED_MIME_TYPES })));
    }
    Ok(mime)
}
