#![allow(clippy::unwrap_used)]
// Integration tests for `RduClient` using wiremock.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use rductl_api::{
    ActivationMode, BatchRequest, ConfirmationMode, Credentials, Error, PublishingMode, RduClient,
    SearchData, WireCommand,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RduClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = RduClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn credentials(password: &str) -> Credentials {
    Credentials::new("admin", password.to_string().into())
}

async fn logged_in() -> (MockServer, RduClient) {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "tok-123", "serverVersion": "4.2.1" })),
        )
        .mount(&server)
        .await;
    client.login(&credentials("secret")).await.unwrap();
    (server, client)
}

fn search_request(cursor: Option<&str>) -> BatchRequest {
    BatchRequest {
        batch_id: Uuid::new_v4(),
        activation: ActivationMode::NoActivation,
        confirmation: ConfirmationMode::NoConfirmation,
        publishing: PublishingMode::NoPublishing,
        commands: vec![WireCommand::Search {
            device_type: "DOCSIS".into(),
            mac_pattern: "*".into(),
            cursor: cursor.map(String::from),
            page_size: 100,
        }],
    }
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .and(body_partial_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "tok-123", "serverVersion": "4.2.1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let info = client.login(&credentials("secret")).await.unwrap();

    assert_eq!(info.server_version.as_deref(), Some("4.2.1"));
    assert!(client.has_session());
}

#[tokio::test]
async fn test_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": "BAD_CREDENTIALS", "message": "invalid user or password" }
        })))
        .mount(&server)
        .await;

    let result = client.login(&credentials("wrong")).await;

    match result {
        Err(Error::Authentication { message }) => {
            assert_eq!(message, "BAD_CREDENTIALS: invalid user or password");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.has_session());
}

// ── Batch tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_post_batch_round_trip() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .and(header("X-Session-Token", "tok-123"))
        .and(body_partial_json(json!({
            "activation": "no-activation",
            "commands": [{ "op": "search", "deviceType": "DOCSIS", "cursor": "bm-7" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchId": "b-1",
            "status": { "error": false, "warning": false },
            "commands": [{
                "error": false,
                "data": { "deviceIds": ["1,6,00:11:22:33:44:55"], "cursor": "bm-8" }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client.post_batch(&search_request(Some("bm-7"))).await.unwrap();

    assert_eq!(reply.batch_id, "b-1");
    assert!(!reply.status.error);
    let page: SearchData = serde_json::from_value(reply.commands[0].data.clone()).unwrap();
    assert_eq!(page.device_ids, vec!["1,6,00:11:22:33:44:55".to_string()]);
    assert_eq!(page.cursor.as_deref(), Some("bm-8"));
}

#[tokio::test]
async fn test_post_batch_returns_error_status_as_reply() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batchId": "b-2",
            "status": { "error": true, "errorMessage": "BATCH_FAILED" },
            "commands": [{ "error": true, "errorMessage": "duplicate MAC" }]
        })))
        .mount(&server)
        .await;

    let reply = client.post_batch(&search_request(None)).await.unwrap();

    assert!(reply.status.error);
    assert_eq!(reply.status.error_message.as_deref(), Some("BATCH_FAILED"));
    assert_eq!(
        reply.commands[0].error_message.as_deref(),
        Some("duplicate MAC")
    );
}

#[tokio::test]
async fn test_post_batch_session_expired() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.post_batch(&search_request(None)).await;
    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_post_batch_gateway_error() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "RDU unavailable" }
        })))
        .mount(&server)
        .await;

    let result = client.post_batch(&search_request(None)).await;
    match result {
        Err(Error::Gateway { message, status }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "RDU unavailable");
        }
        other => panic!("expected Gateway error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_post_batch_malformed_reply() {
    let (server, client) = logged_in().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/batch"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.post_batch(&search_request(None)).await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert_eq!(body, "not json"),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_post_batch_without_session() {
    let (_server, client) = setup().await;

    let result = client.post_batch(&search_request(None)).await;
    assert!(matches!(result, Err(Error::SessionReleased)));
}

// ── Release tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_release_sends_delete_once() {
    let (server, client) = logged_in().await;

    Mock::given(method("DELETE"))
        .and(path("/api/v1/session"))
        .and(header("X-Session-Token", "tok-123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.release().await.unwrap();
    assert!(!client.has_session());

    let second = client.release().await;
    assert!(matches!(second, Err(Error::SessionReleased)));
}
