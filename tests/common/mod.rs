use std::sync::Arc;

use aurum_api::{
    auth::{auth_routes, AuthConfig, AuthService, TokenPair, ADMIN_ROLE},
    config::AppConfig,
    db,
    entities::role,
    events::{self, EventSender},
    handlers::AppServices,
    services::users::CreateUserRequest,
    AppState,
};
use axum::{
    body::Body,
    http::{Method, Request},
    middleware, Router,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery-staple";

const TEST_JWT_SECRET: &str = "k9!xQ2#mE7$vR4&nW8*pJ1@hL5%tY3^bN6?cF0~dG2+sZ9-aV7=uK4_iO1;eM8w5Xq";

/// Helper harness spinning up the full application state on a throwaway
/// SQLite database, with the permission catalog seeded and an admin account
/// already logged in.
pub struct TestApp {
    router: Router,
    #[allow(dead_code)]
    pub state: AppState,
    tokens: TokenPair,
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("temp dir for sqlite");
        let db_path = db_dir.path().join("aurum_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::from_app_config(&cfg);
        let auth_service = Arc::new(AuthService::new(
            auth_cfg,
            db_arc.clone(),
            Some(Arc::new(event_sender.clone())),
        ));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));
        services
            .access
            .seed_catalog()
            .await
            .expect("seed permission catalog");

        let admin_role = role::Entity::find()
            .filter(role::Column::Name.eq(ADMIN_ROLE))
            .one(&*db_arc)
            .await
            .expect("query admin role")
            .expect("admin role seeded");

        services
            .users
            .create_user(CreateUserRequest {
                username: ADMIN_USERNAME.to_string(),
                display_name: "Test Administrator".to_string(),
                password: ADMIN_PASSWORD.to_string(),
                role_ids: vec![admin_role.id],
                is_active: true,
            })
            .await
            .expect("seed admin user");

        let admin = auth_service
            .authenticate(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .expect("authenticate seeded admin");
        let tokens = auth_service
            .generate_token(&admin)
            .await
            .expect("issue admin tokens");

        let state = AppState {
            db: db_arc,
            config: cfg,
            event_sender,
            services,
        };

        // The auth middleware pulls the service out of request extensions,
        // same wiring as main.rs
        let auth_for_layer = auth_service.clone();
        let router = Router::new()
            .nest("/api/v1", aurum_api::api_v1_routes())
            .nest("/auth", auth_routes().with_state(auth_service.clone()))
            .layer(middleware::from_fn_with_state(
                auth_for_layer,
                |axum::extract::State(auth): axum::extract::State<Arc<AuthService>>,
                 mut req: Request<Body>,
                 next: axum::middleware::Next| async move {
                    req.extensions_mut().insert(auth);
                    next.run(req).await
                },
            ))
            .with_state(state.clone());

        Self {
            router,
            state,
            tokens,
            auth_service,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Access the auth service used by the test application.
    #[allow(dead_code)]
    pub fn auth_service(&self) -> Arc<AuthService> {
        self.auth_service.clone()
    }

    /// The bearer token for the seeded admin user.
    pub fn token(&self) -> &str {
        &self.tokens.access_token
    }

    /// The full token pair issued to the seeded admin user.
    #[allow(dead_code)]
    pub fn tokens(&self) -> &TokenPair {
        &self.tokens
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}
