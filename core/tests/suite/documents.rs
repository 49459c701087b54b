use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use docshelf_protocol::AddDocumentParams;
use docshelf_protocol::DeleteDocumentParams;
use docshelf_protocol::DocumentMetadata;
use docshelf_protocol::ErrorKind;
use docshelf_protocol::ListDocumentsParams;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

use crate::suite::common::collection_json;
use crate::suite::common::file_json;
use crate::suite::common::ops_for;
use crate::suite::common::test_config;

fn add_params(source: &str) -> AddDocumentParams {
    AddDocumentParams {
        source: source.to_string(),
        metadata: None,
    }
}

async fn mount_collection(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": [collection_json("collections/c1", "tool-docs")]
        })))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn add_document_uploads_content_and_fingerprint() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": file_json("f-1", "notes.txt", "text/plain")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"hello docshelf").unwrap();

    let ops = ops_for(&server);
    let result = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap();

    assert_eq!(result.document.id, "f-1");
    assert_eq!(result.collection_id, "collections/c1");
    assert_eq!(result.fingerprint.content_hash.len(), 64);
    assert_ne!(
        result.fingerprint.dedupe_key,
        result.fingerprint.content_hash
    );

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/v1/files")
        .unwrap();
    assert_eq!(upload.headers.get("x-api-key").unwrap(), "test-key");
    let body = upload.body_json::<serde_json::Value>().unwrap();
    assert_eq!(body["collectionId"], "collections/c1");
    assert_eq!(body["displayName"], "notes.txt");
    assert_eq!(body["mimeType"], "text/plain");
    assert_eq!(body["sizeBytes"], 14);
    assert_eq!(body["content"], STANDARD.encode(b"hello docshelf"));
    assert_eq!(body["dedupeKey"], result.fingerprint.dedupe_key.as_str());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn metadata_title_overrides_the_display_name() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": file_json("f-1", "Quarterly Report", "text/plain")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("q3.txt");
    std::fs::write(&file_path, b"numbers").unwrap();

    let ops = ops_for(&server);
    ops.add_document(AddDocumentParams {
        source: file_path.to_string_lossy().into_owned(),
        metadata: Some(DocumentMetadata {
            title: Some("Quarterly Report".to_string()),
            ..Default::default()
        }),
    })
    .await
    .unwrap();

    let requests = server.received_requests().await.unwrap();
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/v1/files")
        .unwrap();
    let body = upload.body_json::<serde_json::Value>().unwrap();
    assert_eq!(body["displayName"], "Quarterly Report");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_missing_local_file_fails_before_any_remote_call() {
    let server = MockServer::start().await;

    let ops = ops_for(&server);
    let err = ops
        .add_document(add_params("/definitely/not/here.txt"))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert!(!err.retryable);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn the_size_cap_is_enforced_before_any_remote_call() {
    let server = MockServer::start().await;
    let mut config = test_config(&server);
    config.max_file_bytes = 8;
    let ops = docshelf_core::Ops::new(config).unwrap();

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("big.txt");
    std::fs::write(&file_path, b"way past the cap").unwrap();

    let err = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::FileTooLarge);
    assert!(!err.retryable);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_unsupported_extension_is_rejected_locally() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("tool.exe");
    std::fs::write(&file_path, b"MZ").unwrap();

    let ops = ops_for(&server);
    let err = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::UnsupportedFileType);
    assert!(err.detail.unwrap()["allowed"].is_array());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_url_source_is_staged_without_leaking_the_api_key() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("GET"))
        .and(path("/papers/report.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"remote report body".to_vec(), "text/plain"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": file_json("f-7", "report.txt", "text/plain")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let result = ops
        .add_document(add_params(&format!("{}/papers/report.txt", server.uri())))
        .await
        .unwrap();
    assert_eq!(result.document.id, "f-7");

    let requests = server.received_requests().await.unwrap();
    let download = requests
        .iter()
        .find(|r| r.url.path() == "/papers/report.txt")
        .unwrap();
    assert!(download.headers.get("x-api-key").is_none());
    let upload = requests
        .iter()
        .find(|r| r.url.path() == "/v1/files")
        .unwrap();
    assert_eq!(upload.headers.get("x-api-key").unwrap(), "test-key");
    let body = upload.body_json::<serde_json::Value>().unwrap();
    assert_eq!(body["displayName"], "report.txt");
    assert_eq!(body["mimeType"], "text/plain");
    assert_eq!(body["sizeBytes"], 18);
    assert_eq!(body["content"], STANDARD.encode(b"remote report body"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_failing_download_maps_to_download_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let err = ops
        .add_document(add_params(&format!("{}/gone.pdf", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::DownloadFailed);
    assert!(err.retryable);
    assert_eq!(err.detail.unwrap()["httpStatus"], 404);
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/v1/files"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_rate_limited_upload_is_retried() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {
                "code": 429,
                "message": "Resource has been exhausted (e.g. check quota).",
                "status": "RESOURCE_EXHAUSTED"
            }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": file_json("f-1", "notes.txt", "text/plain")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"hello").unwrap();

    let ops = ops_for(&server);
    let result = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap();
    assert_eq!(result.document.id, "f-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_failed_indexing_state_surfaces_as_an_error() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "id": "f-9",
                "uri": "indexes/f-9",
                "mimeType": "text/plain",
                "displayName": "notes.txt",
                "state": "failed",
                "error": { "message": "extraction crashed" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"hello").unwrap();

    let ops = ops_for(&server);
    let err = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::IndexingFailed);
    assert_eq!(err.message, "extraction crashed");
    assert_eq!(err.detail.unwrap()["docId"], "f-9");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_indexing_timeout_gets_its_own_kind() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "id": "f-9",
                "uri": "indexes/f-9",
                "mimeType": "text/plain",
                "displayName": "notes.txt",
                "state": "failed",
                "error": { "message": "processing timed out after 300s" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"hello").unwrap();

    let ops = ops_for(&server);
    let err = ops
        .add_document(add_params(&file_path.to_string_lossy()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IndexingTimeout);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn listing_pages_newest_first_over_one_remote_fetch() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/files"))
        .and(query_param("collectionId", "collections/c1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {
                    "id": "f-old", "uri": "indexes/f-old", "mimeType": "text/plain",
                    "displayName": "old.txt", "createTime": "2026-01-01T00:00:00Z"
                },
                {
                    "id": "f-new", "uri": "indexes/f-new", "mimeType": "text/plain",
                    "displayName": "new.txt", "createTime": "2026-03-01T00:00:00Z"
                },
                {
                    "id": "f-mid", "uri": "indexes/f-mid", "mimeType": "text/plain",
                    "displayName": "mid.txt", "createTime": "2026-02-01T00:00:00Z"
                },
            ]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let first = ops
        .list_documents(ListDocumentsParams {
            page: Some(1),
            page_size: Some(2),
            filters: None,
        })
        .await
        .unwrap();
    assert_eq!(first.total, 3);
    assert!(first.has_more);
    let ids: Vec<&str> = first.documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["f-new", "f-mid"]);

    let second = ops
        .list_documents(ListDocumentsParams {
            page: Some(2),
            page_size: Some(2),
            filters: None,
        })
        .await
        .unwrap();
    assert_eq!(second.documents.len(), 1);
    assert_eq!(second.documents[0].id, "f-old");
    assert!(!second.has_more);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_page_past_the_end_is_empty_not_an_error() {
    let server = MockServer::start().await;
    mount_collection(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [file_json("f-1", "only.txt", "text/plain")]
        })))
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let result = ops
        .list_documents(ListDocumentsParams {
            page: Some(9),
            page_size: Some(10),
            filters: None,
        })
        .await
        .unwrap();
    assert_eq!(result.total, 1);
    assert!(result.documents.is_empty());
    assert!(!result.has_more);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_reports_the_document_gone() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/files/f-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let result = ops
        .delete_document(DeleteDocumentParams {
            doc_id: "f-1".to_string(),
        })
        .await
        .unwrap();
    assert!(result.deleted);
    assert_eq!(result.doc_id, "f-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn deleting_a_missing_document_maps_to_file_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/files/f-404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "File f-404 does not exist", "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let err = ops
        .delete_document(DeleteDocumentParams {
            doc_id: "f-404".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::FileNotFound);
    assert!(!err.retryable);
}
