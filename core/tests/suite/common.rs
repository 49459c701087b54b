//! Shared fixtures for the integration suite.

use std::time::Duration;

use docshelf_core::Config;
use docshelf_core::Ops;
use serde_json::Value;
use serde_json::json;
use wiremock::MockServer;

pub fn test_config(server: &MockServer) -> Config {
    Config {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        collection: Some("tool-docs".to_string()),
        request_timeout: Duration::from_secs(5),
        max_file_bytes: 1024 * 1024,
    }
}

pub fn ops_for(server: &MockServer) -> Ops {
    Ops::new(test_config(server)).unwrap()
}

pub fn collection_json(id: &str, name: &str) -> Value {
    json!({ "id": id, "displayName": name })
}

pub fn file_json(id: &str, name: &str, mime: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("indexes/{id}"),
        "mimeType": mime,
        "displayName": name,
        "sizeBytes": 42,
        "state": "active",
    })
}
