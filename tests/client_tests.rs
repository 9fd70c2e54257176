//! Client-side behavior against a mocked server: coordinated token refresh,
//! retry-once semantics, and the optimistic-delete recovery reload.

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aurum_api::auth::TokenPair;
use aurum_api::client::{ApiClient, ClientError};
use aurum_api::valuation::DocumentKind;

fn pair(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
        token_type: "Bearer".to_string(),
        expires_in: 900,
        refresh_expires_in: 86400,
    }
}

fn pair_json(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "Bearer",
        "expires_in": 900,
        "refresh_expires_in": 86400
    })
}

fn empty_page() -> serde_json::Value {
    json!({
        "success": true,
        "data": {
            "items": [],
            "total": 0,
            "page": 1,
            "page_size": 20,
            "total_pages": 0
        }
    })
}

fn error_body(error: &str, message: &str) -> serde_json::Value {
    json!({
        "error": error,
        "message": message,
        "timestamp": "2025-08-25T10:00:00.000Z"
    })
}

fn document_json(id: Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "kind": "Order",
        "number": "ORD-000001",
        "description": "Ring for collection",
        "wholesaler_id": null,
        "document_date": "2025-08-20T09:00:00Z",
        "agreed_gold_rate": "60",
        "total24k_product_in": "0",
        "total24k_product_out": "5.2800",
        "total24k_scrap_in": "0",
        "total24k_scrap_out": "0",
        "total24k_in": "0",
        "total24k_out": "5.2800",
        "total24k": "-316.80",
        "total_cash_in": "0",
        "total_cash_out": "0",
        "total_bank_in": "0",
        "total_bank_out": "0",
        "total_money_in": "0",
        "total_money_out": "0",
        "total_money": "0",
        "created_at": "2025-08-20T09:00:00Z",
        "updated_at": null
    })
}

fn client_for(server: &MockServer, tokens: TokenPair) -> ApiClient {
    let base = Url::parse(&server.uri()).expect("mock server url");
    ApiClient::new(base, tokens).expect("client")
}

#[tokio::test]
async fn refreshes_once_and_retries_after_a_401() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(header("authorization", "Bearer stale-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body(
            "Unauthorized",
            "Token has expired",
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "stale-refresh" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(pair_json("fresh-access", "fresh-refresh")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, pair("stale-access", "stale-refresh"));
    let page = client
        .list_products(1, 20, None, None)
        .await
        .expect("retried request");
    assert_eq!(page.total, 0);

    // The coordinator now holds the rotated pair
    let current = client.tokens().current();
    assert_eq!(current.access_token, "fresh-access");
    assert_eq!(current.refresh_token, "fresh-refresh");
}

#[tokio::test]
async fn concurrent_stale_callers_share_a_single_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(header("authorization", "Bearer stale-access"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body(
            "Unauthorized",
            "Token has expired",
        )))
        .expect(1..=4)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(pair_json("fresh-access", "fresh-refresh")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(header("authorization", "Bearer fresh-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page()))
        .expect(4)
        .mount(&server)
        .await;

    let client = Arc::new(client_for(&server, pair("stale-access", "stale-refresh")));
    let mut handles = Vec::new();
    for _ in 0..4 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client.list_products(1, 20, None, None).await
        }));
    }
    for handle in handles {
        let page = handle.await.expect("task").expect("request");
        assert_eq!(page.total, 0);
    }
}

#[tokio::test]
async fn rejected_refresh_surfaces_as_an_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body(
            "Unauthorized",
            "Token has expired",
        )))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body(
            "Unauthorized",
            "Invalid token",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, pair("stale-access", "stale-refresh"));
    let error = client
        .list_products(1, 20, None, None)
        .await
        .expect_err("refresh cannot succeed");
    assert_matches!(error, ClientError::Auth(message) if message.contains("401"));
}

#[tokio::test]
async fn failed_delete_reloads_the_first_page() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/orders/{id}")))
        .respond_with(ResponseTemplate::new(500).set_body_json(error_body(
            "Internal Server Error",
            "Internal server error",
        )))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "items": [document_json(id)],
                "total": 1,
                "page": 1,
                "page_size": 20,
                "total_pages": 1
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, pair("valid-access", "valid-refresh"));
    let recovery = client
        .delete_document_reconciling(DocumentKind::Order, id, 20)
        .await
        .expect_err("delete was refused");

    assert_matches!(recovery.error, ClientError::Api { status, .. } if status == 500);
    let reloaded = recovery.reloaded.expect("first page came back");
    assert_eq!(reloaded.total, 1);
    assert_eq!(reloaded.items[0].number, "ORD-000001");
    assert_eq!(reloaded.items[0].id, id);
}

#[tokio::test]
async fn api_errors_carry_the_server_message() {
    let server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path(format!("/api/v1/products/{id}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(error_body(
            "Not Found",
            &format!("Not found: Product {id} not found"),
        )))
        .mount(&server)
        .await;

    let client = client_for(&server, pair("valid-access", "valid-refresh"));
    let error = client.get_product(id).await.expect_err("missing product");
    assert_matches!(
        error,
        ClientError::Api { status, message }
            if status == 404 && message.contains("not found")
    );
}

#[tokio::test]
async fn login_wraps_the_issued_pair() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "pw" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(pair_json("issued-access", "issued-refresh")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer issued-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": Uuid::new_v4(),
            "name": "Test Administrator",
            "roles": ["admin"],
            "permissions": ["*"],
            "token_id": Uuid::new_v4()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let base = Url::parse(&server.uri()).expect("mock server url");
    let client = ApiClient::login(base, "admin", "pw").await.expect("login");
    assert_eq!(client.tokens().current().access_token, "issued-access");

    let me = client.me().await.expect("profile");
    assert_eq!(me.name.as_deref(), Some("Test Administrator"));
    assert!(me.roles.contains(&"admin".to_string()));
}
