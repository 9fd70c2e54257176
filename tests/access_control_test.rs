mod common;

use axum::{body, http::Method, response::Response};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn permission_id(app: &TestApp, name: &str) -> Uuid {
    let response = app
        .request_authenticated(Method::GET, "/api/v1/permissions?pageSize=100", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let id = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .and_then(|p| p["id"].as_str())
        .unwrap_or_else(|| panic!("permission {name} is not seeded"));
    Uuid::parse_str(id).expect("permission uuid")
}

async fn admin_role_id(app: &TestApp) -> Uuid {
    let response = app
        .request_authenticated(Method::GET, "/api/v1/roles", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let id = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == "admin")
        .and_then(|r| r["id"].as_str())
        .expect("seeded admin role")
        .to_string();
    Uuid::parse_str(&id).expect("role uuid")
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn the_permission_catalog_is_seeded_on_startup() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(Method::GET, "/api/v1/permissions?pageSize=100", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 44);
    let names: Vec<&str> = body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(names.contains(&"products:read"));
    assert!(names.contains(&"supplies:delete"));
    assert!(names.contains(&"permission-groups:update"));

    let response = app
        .request_authenticated(Method::GET, "/api/v1/permission-groups", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["total"], 5);
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn the_admin_role_is_protected() {
    let app = TestApp::new().await;
    let admin_role = admin_role_id(&app).await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/roles/{admin_role}"),
            Some(json!({ "name": "superadmin" })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("cannot be renamed"));

    let response = app
        .request_authenticated(Method::DELETE, &format!("/api/v1/roles/{admin_role}"), None)
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("cannot be deleted"));

    // Everything but the name is still editable
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/api/v1/roles/{admin_role}"),
            Some(json!({ "name": "admin", "description": "Full access" })),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    assert_eq!(body["data"]["description"], "Full access");
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn duplicate_usernames_conflict() {
    let app = TestApp::new().await;

    let payload = json!({
        "username": "counter",
        "display_name": "Counter Staff",
        "password": "super-secret-9"
    });
    let response = app
        .request_authenticated(Method::POST, "/api/v1/users", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .request_authenticated(Method::POST, "/api/v1/users", Some(payload))
        .await;
    assert_eq!(response.status(), 409);
    let body = response_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn bootstrap_admin_skips_populated_installations() {
    let app = TestApp::new().await;

    // The harness already seeded an admin account, so bootstrap must not
    // create another one.
    let created = app
        .state
        .services
        .users
        .bootstrap_admin("admin", "another-password-1")
        .await
        .unwrap();
    assert!(!created);

    let response = app
        .request_authenticated(Method::GET, "/api/v1/users?pageSize=100", None)
        .await;
    assert_eq!(response.status(), 200);
    let body = response_json(response).await;
    let users = body["data"]["items"].as_array().unwrap();
    assert_eq!(
        users
            .iter()
            .filter(|u| u["username"] == "admin")
            .count(),
        1
    );
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn role_grants_limit_what_a_user_can_do() {
    let app = TestApp::new().await;
    let products_read = permission_id(&app, "products:read").await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/roles",
            Some(json!({
                "name": "clerk",
                "description": "Reads the catalog",
                "permission_ids": [products_read]
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    let role_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["permissions"][0]["name"], "products:read");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/users",
            Some(json!({
                "username": "clerk1",
                "display_name": "Front Desk",
                "password": "super-secret-9",
                "role_ids": [role_id]
            })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["data"]["roles"][0]["name"], "clerk");

    let response = app
        .request(
            Method::POST,
            "/auth/login",
            Some(json!({ "username": "clerk1", "password": "super-secret-9" })),
            None,
        )
        .await;
    assert_eq!(response.status(), 200);
    let pair = response_json(response).await;
    let token = pair["access_token"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, "/auth/me", None, Some(&token))
        .await;
    let me = response_json(response).await;
    assert_eq!(me["roles"], json!(["clerk"]));
    assert_eq!(me["permissions"], json!(["products:read"]));

    // Granted scope works, everything else bounces
    let response = app
        .request(Method::GET, "/api/v1/products", None, Some(&token))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({ "name": "Bracelet" })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), 403);

    let response = app
        .request(Method::GET, "/api/v1/scenarios", None, Some(&token))
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore = "requires the SQLite integration environment"]
async fn malformed_permission_names_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/permissions",
            Some(json!({ "name": "Bad Name" })),
        )
        .await;
    assert_eq!(response.status(), 400);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Validation failed");

    let response = app
        .request_authenticated(
            Method::POST,
            "/api/v1/permissions",
            Some(json!({ "name": "reports:read", "description": "Read reports" })),
        )
        .await;
    assert_eq!(response.status(), 201);
    let body = response_json(response).await;
    assert_eq!(body["data"]["name"], "reports:read");
}
