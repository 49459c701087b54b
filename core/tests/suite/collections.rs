use docshelf_protocol::CreateCollectionParams;
use docshelf_protocol::ErrorKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

use crate::suite::common::collection_json;
use crate::suite::common::ops_for;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn creating_an_existing_collection_fails_with_the_existing_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collections": [collection_json("collections/c1", "tool-docs")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let err = ops
        .create_collection(CreateCollectionParams { display_name: None })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidInput);
    assert!(!err.retryable);
    assert_eq!(
        err.detail.unwrap()["existingCollectionId"],
        "collections/c1"
    );
    // The collision is detected from the list alone; no create is issued.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn creating_a_collection_also_settles_resolution() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "collections": [] })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": collection_json("collections/fresh", "tool-docs")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let result = ops
        .create_collection(CreateCollectionParams { display_name: None })
        .await
        .unwrap();

    assert!(result.created);
    assert_eq!(result.collection.id, "collections/fresh");
    assert_eq!(result.collection.display_name, "tool-docs");

    // resolve() after an explicit create is answered from the memo.
    assert_eq!(ops.resolver().resolve().await.unwrap(), "collections/fresh");
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn an_explicit_name_creates_a_side_collection_without_priming() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/collections"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "collections": [] })),
        )
        .expect(2)
        .mount(&server)
        .await;
    // One-shot mocks, consumed in mount order.
    Mock::given(method("POST"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": collection_json("collections/side", "scratch")
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "collection": collection_json("collections/main", "tool-docs")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = ops_for(&server);
    let result = ops
        .create_collection(CreateCollectionParams {
            display_name: Some("scratch".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(result.collection.id, "collections/side");

    // "scratch" is not the configured collection, so resolution still runs
    // its own find-or-create for "tool-docs".
    assert_eq!(ops.resolver().resolve().await.unwrap(), "collections/main");
}
