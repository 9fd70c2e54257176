mod common;

use axum::{body, http::Method, response::Response};
use serde_json::{json, Value};

use common::{TestApp, ADMIN_PASSWORD, ADMIN_USERNAME};

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn login(app: &TestApp, username: &str, password: &str) -> Response {
    app.request(
        Method::POST,
        "/auth/login",
        Some(json!({ "username": username, "password": password })),
        None,
    )
    .await
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn login_issues_a_bearer_token_pair() {
    let app = TestApp::new().await;

    let response = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 200);
    let pair = response_json(response).await;
    assert_eq!(pair["token_type"], "Bearer");
    assert!(!pair["access_token"].as_str().unwrap().is_empty());
    assert!(!pair["refresh_token"].as_str().unwrap().is_empty());
    assert!(pair["expires_in"].as_i64().unwrap() > 0);
    assert!(pair["refresh_expires_in"].as_i64().unwrap() > pair["expires_in"].as_i64().unwrap());
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn login_with_wrong_credentials_is_rejected() {
    let app = TestApp::new().await;

    let response = login(&app, ADMIN_USERNAME, "wrong-password").await;
    assert_eq!(response.status(), 401);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INVALID_CREDENTIALS");
    assert_eq!(body["error"]["message"], "Invalid credentials");

    // Unknown usernames look exactly like bad passwords
    let response = login(&app, "nobody", ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 401);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INVALID_CREDENTIALS");
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn me_reports_the_authenticated_identity() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/auth/me", None)
        .await;
    assert_eq!(response.status(), 200);
    let me = response_json(response).await;
    assert_eq!(me["name"], "Test Administrator");
    let roles = me["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r == "admin"));
    let permissions = me["permissions"].as_array().unwrap();
    assert!(permissions.iter().any(|p| p == "*"));
    assert!(me["user_id"].as_str().is_some());
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn refresh_rotates_the_refresh_token() {
    let app = TestApp::new().await;

    let response = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let pair = response_json(response).await;
    let first_refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": first_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let rotated = response_json(response).await;
    let second_access = rotated["access_token"].as_str().unwrap().to_string();
    let second_refresh = rotated["refresh_token"].as_str().unwrap().to_string();
    assert_ne!(second_refresh, first_refresh);

    // Each refresh token works exactly once
    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": first_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);

    // The rotated pair is fully usable
    let response = app
        .request(Method::GET, "/auth/me", None, Some(&second_access))
        .await;
    assert_eq!(response.status(), 200);
    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": second_refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn logout_revokes_the_presented_tokens() {
    let app = TestApp::new().await;

    let response = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let pair = response_json(response).await;
    let access = pair["access_token"].as_str().unwrap().to_string();
    let refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let response = app
        .request(
            Method::POST,
            "/auth/logout",
            Some(json!({ "refresh_token": refresh })),
            Some(&access),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Successfully logged out");

    let response = app
        .request(Method::GET, "/auth/me", None, Some(&access))
        .await;
    assert_eq!(response.status(), 401);

    let response = app
        .request(
            Method::POST,
            "/auth/refresh",
            Some(json!({ "refresh_token": refresh })),
            None,
        )
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn disabled_accounts_cannot_login() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "username": "ghost",
                "display_name": "Ghost",
                "password": "super-secret-9",
                "is_active": false
            })),
        )
        .await;
    assert_eq!(response.status(), 201);

    let response = login(&app, "ghost", "super-secret-9").await;
    assert_eq!(response.status(), 403);
    let body = response_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_USER_DISABLED");
}
