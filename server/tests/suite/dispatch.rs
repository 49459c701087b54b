//! Full request-to-response flows: JSON in, dispatch, operations layer,
//! mocked index service behind it.

use std::time::Duration;

use docshelf_core::Config;
use docshelf_core::Ops;
use docshelf_server::processor::dispatch_message;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn ops_for(server: &MockServer) -> Ops {
    Ops::new(Config {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        collection: Some("tool-docs".to_string()),
        request_timeout: Duration::from_secs(5),
        max_file_bytes: 1024 * 1024,
    })
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delete_document_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/files/f-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let msg = json!({
        "id": 1,
        "method": "tools.call",
        "params": { "name": "delete_document", "arguments": { "docId": "f-1" } }
    });

    let response = dispatch_message(&ops, &msg.to_string()).await;
    assert_eq!(response["result"]["deleted"], true);
    assert_eq!(response["result"]["docId"], "f-1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_remote_failure_arrives_as_a_classified_payload() {
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
    let msg = json!({
        "id": 2,
        "method": "tools.call",
        "params": { "name": "delete_document", "arguments": { "docId": "f-404" } }
    });

    let response = dispatch_message(&ops, &msg.to_string()).await;
    let result = &response["result"];
    assert_eq!(result["error"], true);
    assert_eq!(result["errorCode"], "FILE_NOT_FOUND");
    assert_eq!(result["retryable"], false);
    assert!(result["message"].as_str().unwrap().contains("f-404"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn add_document_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": [{ "id": "collections/c1", "displayName": "tool-docs" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file": {
                "id": "f-1",
                "uri": "indexes/f-1",
                "mimeType": "text/plain",
                "displayName": "Design Notes",
                "sizeBytes": 5,
                "state": "active"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let file_path = dir.path().join("notes.txt");
    std::fs::write(&file_path, b"hello").unwrap();

    let ops = ops_for(&server);
    let msg = json!({
        "id": 3,
        "method": "tools.call",
        "params": {
            "name": "add_document",
            "arguments": {
                "source": file_path.to_string_lossy(),
                "metadata": { "title": "Design Notes", "tags": ["design"] }
            }
        }
    });

    let response = dispatch_message(&ops, &msg.to_string()).await;
    let result = &response["result"];
    assert_eq!(result["document"]["id"], "f-1");
    assert_eq!(result["document"]["displayName"], "Design Notes");
    assert_eq!(result["collectionId"], "collections/c1");
    assert_eq!(result["fingerprint"]["contentHash"].as_str().unwrap().len(), 64);
    assert_eq!(result["fingerprint"]["dedupeKey"].as_str().unwrap().len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn list_documents_round_trips() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": [{ "id": "collections/c1", "displayName": "tool-docs" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [{
                "id": "f-1",
                "uri": "indexes/f-1",
                "mimeType": "application/pdf",
                "displayName": "alpha.pdf",
                "sizeBytes": 9000
            }]
        })))
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let msg = json!({
        "id": 4,
        "method": "tools.call",
        "params": { "name": "list_documents", "arguments": {} }
    });

    let response = dispatch_message(&ops, &msg.to_string()).await;
    let result = &response["result"];
    assert_eq!(result["total"], 1);
    assert_eq!(result["page"], 1);
    assert_eq!(result["hasMore"], false);
    assert_eq!(result["documents"][0]["displayName"], "alpha.pdf");
}
