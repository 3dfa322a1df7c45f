//! Integration tests for the catalog HTTP client using wiremock.
//!
//! These tests verify:
//! - Collection listing, search pagination, entity fetch, and upsert
//! - Error handling for various HTTP status codes
//! - Retry behavior for transient errors
//! - Bearer token header presence
//! - Chat-completion request shape and error mapping

use std::time::Duration;

use metasync_client::{CatalogClient, ClientConfig, ClientError, OpenAiClient, OpenAiConfig};
use metasync_core::enrich::DescriptionGenerator;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

// ============================================================================
// Test Helpers
// ============================================================================

/// Create a test client pointing to the mock server
fn test_client(server: &MockServer) -> CatalogClient {
    let config = ClientConfig::builder(server.uri())
        .timeout(Duration::from_secs(5))
        .max_retries(2)
        .retry_initial_delay(Duration::from_millis(10))
        .retry_max_delay(Duration::from_millis(50))
        .build()
        .unwrap();
    CatalogClient::new(config).unwrap()
}

/// Create a test client with a bearer token
fn test_client_with_token(server: &MockServer, token: &str) -> CatalogClient {
    let config = ClientConfig::builder(server.uri())
        .token(token)
        .timeout(Duration::from_secs(5))
        .max_retries(2)
        .retry_initial_delay(Duration::from_millis(10))
        .retry_max_delay(Duration::from_millis(50))
        .build()
        .unwrap();
    CatalogClient::new(config).unwrap()
}

fn collection_body() -> serde_json::Value {
    json!({
        "value": [
            { "name": "col-abc123", "friendlyName": "Sales" },
            { "name": "col-def456", "friendlyName": "Finance" }
        ]
    })
}

// ============================================================================
// Collection Tests
// ============================================================================

#[tokio::test]
async fn test_list_collections_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let collections = client.list_collections().await.unwrap();

    assert_eq!(collections.len(), 2);
    assert_eq!(collections[0].name, "col-abc123");
    assert_eq!(collections[0].friendly_name, "Sales");
    assert_eq!(collections[1].friendly_name, "Finance");
}

#[tokio::test]
async fn test_bearer_token_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client_with_token(&server, "secret-token");
    client.list_collections().await.unwrap();
}

#[tokio::test]
async fn test_unauthorized_maps_to_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "Unauthorized", "message": "token expired" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.list_collections().await.unwrap_err();

    match err {
        ClientError::Unauthorized(msg) => assert_eq!(msg, "token expired"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

// ============================================================================
// Search Tests
// ============================================================================

#[tokio::test]
async fn test_search_single_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/search/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "g-1", "name": "orders", "qualifiedName": "mssql://srv/db/orders" },
                { "id": "g-2", "name": "customers", "qualifiedName": "mssql://srv/db/customers" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let hits = client.search_by_collection("col-abc123").await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "g-1");
    assert_eq!(hits[1].qualified_name, "mssql://srv/db/customers");
}

#[tokio::test]
async fn test_search_filter_targets_collection() {
    let server = MockServer::start().await;

    let expected_body = json!({
        "keywords": "*",
        "filter": { "and": [ { "or": [ { "collectionId": "col-abc123" } ] } ] },
        "limit": 50,
        "offset": 0
    });

    Mock::given(method("POST"))
        .and(path("/api/search/query"))
        .and(body_json(&expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let hits = client.search_by_collection("col-abc123").await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_search_paginates_until_short_page() {
    let server = MockServer::start().await;

    // Full first page forces a second request; short second page ends the loop.
    let full_page: Vec<serde_json::Value> = (0..50)
        .map(|i| {
            json!({
                "id": format!("g-{}", i),
                "name": format!("asset{}", i),
                "qualifiedName": format!("mssql://srv/db/asset{}", i)
            })
        })
        .collect();

    Mock::given(method("POST"))
        .and(path("/api/search/query"))
        .respond_with(move |req: &Request| {
            let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
            let offset = body["offset"].as_u64().unwrap();
            if offset == 0 {
                ResponseTemplate::new(200).set_body_json(json!({ "value": full_page.clone() }))
            } else {
                ResponseTemplate::new(200).set_body_json(json!({
                    "value": [
                        { "id": "g-50", "name": "last", "qualifiedName": "mssql://srv/db/last" }
                    ]
                }))
            }
        })
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let hits = client.search_by_collection("col-abc123").await.unwrap();

    assert_eq!(hits.len(), 51);
    assert_eq!(hits[50].id, "g-50");
}

// ============================================================================
// Entity Tests
// ============================================================================

#[tokio::test]
async fn test_get_entity_by_guid_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/atlas/v2/entity/guid/g-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "entity": {
                "guid": "g-1",
                "typeName": "azure_sql_table",
                "attributes": {
                    "name": "orders",
                    "qualifiedName": "mssql://srv/db/orders"
                }
            },
            "referredEntities": {
                "c-1": {
                    "guid": "c-1",
                    "attributes": { "name": "order_id" }
                }
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let envelope = client.get_entity_by_guid("g-1").await.unwrap();

    assert_eq!(envelope.entity.name(), Some("orders"));
    assert_eq!(
        envelope.entity.qualified_name(),
        Some("mssql://srv/db/orders")
    );
    assert_eq!(envelope.referred_entities.len(), 1);
}

#[tokio::test]
async fn test_get_entity_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/atlas/v2/entity/guid/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": "ATLAS-404", "message": "guid missing not found" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.get_entity_by_guid("missing").await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
}

#[tokio::test]
async fn test_create_or_update_sends_payload() {
    let server = MockServer::start().await;

    let payload = json!({
        "entity": {
            "guid": "g-1",
            "attributes": {
                "name": "orders",
                "userDescription": "Order fact table."
            }
        }
    });

    Mock::given(method("POST"))
        .and(path("/api/atlas/v2/entity"))
        .and(body_json(&payload))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mutatedEntities": { "UPDATE": [ { "guid": "g-1" } ] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    client.create_or_update(&payload).await.unwrap();
}

// ============================================================================
// Retry Tests
// ============================================================================

#[tokio::test]
async fn test_retry_on_server_error() {
    let server = MockServer::start().await;

    // First attempt fails with 503, mock is then dropped and replaced
    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(collection_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let collections = client.list_collections().await.unwrap();

    assert_eq!(collections.len(), 2);
}

#[tokio::test]
async fn test_no_retry_on_client_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/collections"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = client.list_collections().await.unwrap_err();

    assert!(matches!(err, ClientError::NotFound(_)));
}

// ============================================================================
// Completion Tests
// ============================================================================

fn test_openai_client(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig::new("test-key").with_base_url(server.uri());
    OpenAiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_completion_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  A table of orders.  " } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_openai_client(&server);
    let text = client
        .complete("system prompt", "user prompt", 200, 0.3)
        .await
        .unwrap();

    assert_eq!(text, "A table of orders.");
}

#[tokio::test]
async fn test_completion_request_shape() {
    let server = MockServer::start().await;

    let expected = json!({
        "model": "gpt-4",
        "messages": [
            { "role": "system", "content": "sys" },
            { "role": "user", "content": "usr" }
        ],
        "max_tokens": 200,
        "temperature": 0.3
    });

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [ { "message": { "content": "ok" } } ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_openai_client(&server);
    client.complete("sys", "usr", 200, 0.3).await.unwrap();
}

#[tokio::test]
async fn test_completion_error_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = test_openai_client(&server);
    let err = client
        .complete("sys", "usr", 200, 0.3)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("429"));
}

#[tokio::test]
async fn test_completion_empty_choices_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = test_openai_client(&server);
    let err = client
        .complete("sys", "usr", 200, 0.3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        metasync_core::enrich::GenerateError::InvalidResponse(_)
    ));
}
