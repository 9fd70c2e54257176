/*!
 * # Authentication and Authorization Module
 *
 * JWT (HS256) access + refresh tokens with refresh rotation, argon2 password
 * verification, and role/permission based access control. Roles and
 * permissions are resolved from the database at token issue time and carried
 * in the claims, so request-path checks never touch the database.
 */

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, ModelTrait, QueryFilter, QuerySelect,
    RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::entities;
use crate::events::{Event, EventSender};

mod permissions;

pub use permissions::*;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user ID)
    pub name: Option<String>,     // User's display name
    pub roles: Vec<String>,       // User's roles
    pub permissions: Vec<String>, // User's resolved permissions
    pub jti: String,              // JWT ID (unique identifier for this token)
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
    pub nbf: i64,                 // Not valid before time
    pub iss: String,              // Issuer
    pub aud: String,              // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the user has a specific permission, honoring wildcards
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| permission_implies(p, permission))
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}

/// The authenticated user is attached to request extensions by
/// [`auth_middleware`]; handlers pick it up with this extractor.
#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
    pub refresh_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
        refresh_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
            refresh_token_expiration,
        }
    }

    /// Build auth settings from the loaded application configuration
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            jwt_secret: cfg.jwt_secret.clone(),
            jwt_audience: cfg.auth_audience.clone(),
            jwt_issuer: cfg.auth_issuer.clone(),
            access_token_expiration: Duration::from_secs(cfg.jwt_expiration as u64),
            refresh_token_expiration: Duration::from_secs(cfg.refresh_token_expiration as u64),
        }
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
    blacklisted_tokens: Arc<RwLock<Vec<BlacklistedToken>>>,
}

/// Token blacklist entry
#[derive(Clone, Debug)]
struct BlacklistedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: AuthConfig, db: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            config,
            db,
            event_sender,
            blacklisted_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Verify a username/password pair against the users table
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<entities::user::Model, AuthError> {
        let user = entities::user::Entity::find()
            .filter(entities::user::Column::Username.eq(username))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            warn!(username = %username, "Login attempt for disabled account");
            return Err(AuthError::UserDisabled);
        }

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Generate a JWT token pair for a user
    pub async fn generate_token(
        &self,
        user: &entities::user::Model,
    ) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;
        let refresh_exp = now
            + ChronoDuration::from_std(self.config.refresh_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        // Generate unique token IDs
        let access_jti = Uuid::new_v4().to_string();
        let refresh_jti = Uuid::new_v4();

        // Resolve roles and permissions from the database
        let roles = self.get_user_roles(user).await?;
        let permissions = self.get_user_permissions(user).await?;

        // Create access token claims
        let access_claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.display_name.clone()),
            roles: roles.clone(),
            permissions,
            jti: access_jti,
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        // Refresh token claims carry no authorization data
        let refresh_claims = Claims {
            sub: user.id.to_string(),
            name: None,
            roles: vec![],
            permissions: vec![],
            jti: refresh_jti.to_string(),
            iat: now.timestamp(),
            exp: refresh_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &access_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        let refresh_token = encode(
            &Header::new(Algorithm::HS256),
            &refresh_claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        // Persist the refresh token id for rotation checks
        self.store_refresh_token(user.id, refresh_jti, refresh_exp)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
            refresh_expires_in: self.config.refresh_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.jwt_audience]);
        validation.set_issuer(&[&self.config.jwt_issuer]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        // Check if the token is blacklisted
        if self.is_token_blacklisted(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Refresh an access token using a refresh token; the consumed refresh
    /// token is revoked so each one works exactly once.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.validate_token(refresh_token).await?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let token_id = Uuid::parse_str(&claims.jti).map_err(|_| AuthError::InvalidToken)?;

        // The refresh token must still be live in the database
        let refresh_token_valid = self.verify_refresh_token(user_id, token_id).await?;
        if !refresh_token_valid {
            return Err(AuthError::InvalidToken);
        }

        let user = self.get_user(user_id).await?;
        if !user.is_active {
            return Err(AuthError::UserDisabled);
        }

        let new_tokens = self.generate_token(&user).await?;

        // Rotate: the old refresh token is dead from here on
        self.revoke_refresh_token(user_id, token_id).await?;

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::TokenRefreshed(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send token refreshed event");
            }
        }

        Ok(new_tokens)
    }

    /// Revoke an access token (add it to the in-memory blacklist)
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;

        let expiry = Utc::now() + ChronoDuration::seconds(claims.exp - Utc::now().timestamp());
        let blacklisted_token = BlacklistedToken {
            jti: claims.jti,
            expiry,
        };

        let mut blacklist = self.blacklisted_tokens.write().await;
        blacklist.push(blacklisted_token);

        // Drop entries that have expired on their own
        self.clean_blacklist(&mut blacklist);

        Ok(())
    }

    /// Revoke every live refresh token a user holds
    pub async fn revoke_user_refresh_tokens(&self, user_id: Uuid) -> Result<(), AuthError> {
        use entities::refresh_token::{Column, Entity};

        Entity::update_many()
            .col_expr(Column::Revoked, sea_orm::sea_query::Expr::value(true))
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Revoked.eq(false))
            .exec(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        debug!("Revoked all refresh tokens for user {}", user_id);
        Ok(())
    }

    /// Check if a token is blacklisted
    async fn is_token_blacklisted(&self, token_id: &str) -> bool {
        let blacklist = self.blacklisted_tokens.read().await;
        blacklist.iter().any(|t| t.jti == token_id)
    }

    /// Clean up expired tokens from the blacklist
    fn clean_blacklist(&self, blacklist: &mut Vec<BlacklistedToken>) {
        let now = Utc::now();
        blacklist.retain(|t| t.expiry > now);
    }

    /// Get a user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<entities::user::Model, AuthError> {
        entities::user::Entity::find_by_id(user_id)
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?
            .ok_or(AuthError::UserNotFound)
    }

    /// Get user role names through the user_roles join table
    async fn get_user_roles(
        &self,
        user: &entities::user::Model,
    ) -> Result<Vec<String>, AuthError> {
        let roles = user
            .find_related(entities::role::Entity)
            .all(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(roles.into_iter().map(|r| r.name).collect())
    }

    /// Get the union of permission names granted through the user's roles.
    /// Holders of the admin role get the universal wildcard, so their claims
    /// pass the same checks the permission middleware waves them through.
    async fn get_user_permissions(
        &self,
        user: &entities::user::Model,
    ) -> Result<Vec<String>, AuthError> {
        let roles = user
            .find_related(entities::role::Entity)
            .all(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        if roles.iter().any(|r| r.name == ADMIN_ROLE) {
            return Ok(vec!["*".to_string()]);
        }

        let role_ids: Vec<Uuid> = roles.into_iter().map(|r| r.id).collect();
        if role_ids.is_empty() {
            return Ok(vec![]);
        }

        let permissions = entities::permission::Entity::find()
            .join(
                JoinType::InnerJoin,
                entities::permission::Relation::RolePermissions.def(),
            )
            .filter(entities::role_permission::Column::RoleId.is_in(role_ids))
            .distinct()
            .all(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(permissions.into_iter().map(|p| p.name).collect())
    }

    /// Store a refresh token id
    async fn store_refresh_token(
        &self,
        user_id: Uuid,
        token_id: Uuid,
        expiry: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let record = entities::refresh_token::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_id: Set(token_id),
            expires_at: Set(expiry),
            revoked: Set(false),
            created_at: Set(Utc::now()),
        };

        record
            .insert(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        debug!("Stored refresh token {} for user {}", token_id, user_id);
        Ok(())
    }

    /// Verify that a refresh token is live: present, owned by the user,
    /// not revoked and not past its expiry
    async fn verify_refresh_token(&self, user_id: Uuid, token_id: Uuid) -> Result<bool, AuthError> {
        use entities::refresh_token::{Column, Entity};

        let record = Entity::find()
            .filter(Column::TokenId.eq(token_id))
            .filter(Column::UserId.eq(user_id))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        Ok(match record {
            Some(r) => !r.revoked && r.expires_at > Utc::now(),
            None => false,
        })
    }

    /// Revoke a single refresh token
    async fn revoke_refresh_token(&self, user_id: Uuid, token_id: Uuid) -> Result<(), AuthError> {
        use entities::refresh_token::{Column, Entity};

        Entity::update_many()
            .col_expr(Column::Revoked, sea_orm::sea_query::Expr::value(true))
            .filter(Column::TokenId.eq(token_id))
            .filter(Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await
            .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

        debug!("Revoked refresh token {} for user {}", token_id, user_id);
        Ok(())
    }
}

/// Hash a password with argon2 and a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AuthError::InternalError(format!("Stored password hash invalid: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Token pair response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
}

/// Login credentials
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Logout request; the refresh token is revoked alongside the access token
/// when the client still holds one
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("User not found")]
    UserNotFound,

    #[error("User account is disabled")]
    UserDisabled,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING_TOKEN",
                "No authentication token provided".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::RevokedToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REVOKED_TOKEN",
                "Authentication token has been revoked".to_string(),
            ),
            Self::TokenCreation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                msg.clone(),
            ),
            Self::UserNotFound => (
                StatusCode::NOT_FOUND,
                "AUTH_USER_NOT_FOUND",
                "User not found".to_string(),
            ),
            Self::UserDisabled => (
                StatusCode::FORBIDDEN,
                "AUTH_USER_DISABLED",
                "User account is disabled".to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_DATABASE_ERROR",
                "Database error".to_string(),
            ),
            Self::InternalError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            }
        }));

        (status, body).into_response()
    }
}

/// Permission middleware to check if a user has the required permission
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    // Admins pass every permission gate
    if user.is_admin() {
        return Ok(next.run(request).await);
    }

    if !user.has_permission(&required_permission) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Role middleware to check if a user has the required role
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    // The auth service is provided through an Extension layer on the router
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token).await?;

                return Ok(AuthUser {
                    user_id: claims.sub,
                    name: claims.name,
                    roles: claims.roles,
                    permissions: claims.permissions,
                    token_id: claims.jti,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Authentication routes: login and refresh are public, logout and me
/// require a valid bearer token.
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    let protected = axum::Router::new()
        .route("/logout", axum::routing::post(logout_handler))
        .route("/me", axum::routing::get(me_handler))
        .with_auth();

    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .route("/refresh", axum::routing::post(refresh_token_handler))
        .merge(protected)
        .layer(DefaultBodyLimit::max(1024 * 64)) // 64KB limit
}

/// Login handler
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<TokenPair>, AuthError> {
    let user = auth_service
        .authenticate(&credentials.username, &credentials.password)
        .await?;

    let token_pair = auth_service.generate_token(&user).await?;

    info!(user_id = %user.id, "User logged in");
    if let Some(event_sender) = &auth_service.event_sender {
        if let Err(e) = event_sender.send(Event::UserLoggedIn(user.id)).await {
            warn!(error = %e, user_id = %user.id, "Failed to send login event");
        }
    }

    Ok(Json(token_pair))
}

/// Refresh token handler
pub async fn refresh_token_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(refresh_request): Json<RefreshTokenRequest>,
) -> Result<Json<TokenPair>, AuthError> {
    let token_pair = auth_service
        .refresh_token(&refresh_request.refresh_token)
        .await?;

    Ok(Json(token_pair))
}

/// Logout handler: blacklists the presented access token and revokes the
/// refresh token when the client sends one along.
pub async fn logout_handler(
    State(auth_service): State<Arc<AuthService>>,
    auth_user: AuthUser,
    headers: HeaderMap,
    body: Option<Json<LogoutRequest>>,
) -> Result<Json<serde_json::Value>, AuthError> {
    let Some(auth_header) = headers.get(header::AUTHORIZATION) else {
        return Err(AuthError::MissingToken);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingToken)?;

    auth_service.revoke_token(token).await?;

    if let Some(Json(request)) = body {
        if let Some(refresh_token) = request.refresh_token {
            // Best effort: an already-dead refresh token is not an error here
            if let Ok(claims) = auth_service.validate_token(&refresh_token).await {
                if let (Ok(user_id), Ok(token_id)) =
                    (Uuid::parse_str(&claims.sub), Uuid::parse_str(&claims.jti))
                {
                    auth_service
                        .revoke_refresh_token(user_id, token_id)
                        .await?;
                }
            }
        }
    }

    info!(user_id = %auth_user.user_id, "User logged out");
    Ok(Json(
        serde_json::json!({ "message": "Successfully logged out" }),
    ))
}

/// Current-user handler
pub async fn me_handler(auth_user: AuthUser) -> Json<AuthUser> {
    Json(auth_user)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_user_with(roles: &[&str], permissions: &[&str]) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4().to_string(),
            name: Some("Test".to_string()),
            roles: roles.iter().map(|s| s.to_string()).collect(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            token_id: Uuid::new_v4().to_string(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse battery staple").unwrap();
        assert!(verify_password("correct horse battery staple", &hash).unwrap());
        assert!(!verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn permission_check_honors_wildcards() {
        let user = auth_user_with(&["clerk"], &["documents:*"]);
        assert!(user.has_permission("documents:read"));
        assert!(user.has_permission("documents:delete"));
        assert!(!user.has_permission("users:read"));
    }

    #[test]
    fn admin_role_is_detected() {
        let admin = auth_user_with(&["admin"], &[]);
        assert!(admin.is_admin());
        let clerk = auth_user_with(&["clerk"], &[]);
        assert!(!clerk.is_admin());
    }

    #[tokio::test]
    async fn token_round_trip_without_database() {
        // Token validation alone never touches the pool, so a disconnected
        // handle is fine here.
        let config = AuthConfig::new(
            "unit-test-secret-068fd7a3c45b4ad88d3a1f60e2c1b0de-unit-test-secret".to_string(),
            "aurum-clients".to_string(),
            "aurum-api".to_string(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        let service = AuthService::new(
            config.clone(),
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            None,
        );

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            name: Some("Unit".to_string()),
            roles: vec!["clerk".to_string()],
            permissions: vec!["products:read".to_string()],
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(1)).timestamp(),
            nbf: now.timestamp(),
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let decoded = service.validate_token(&token).await.unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.roles, vec!["clerk".to_string()]);
    }

    #[tokio::test]
    async fn revoked_tokens_are_rejected() {
        let config = AuthConfig::new(
            "unit-test-secret-068fd7a3c45b4ad88d3a1f60e2c1b0de-unit-test-secret".to_string(),
            "aurum-clients".to_string(),
            "aurum-api".to_string(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        let service = AuthService::new(
            config.clone(),
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            None,
        );

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            name: None,
            roles: vec![],
            permissions: vec![],
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + ChronoDuration::hours(1)).timestamp(),
            nbf: now.timestamp(),
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        service.revoke_token(&token).await.unwrap();

        let result = service.validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::RevokedToken)));
    }

    #[tokio::test]
    async fn expired_tokens_report_expiry() {
        let config = AuthConfig::new(
            "unit-test-secret-068fd7a3c45b4ad88d3a1f60e2c1b0de-unit-test-secret".to_string(),
            "aurum-clients".to_string(),
            "aurum-api".to_string(),
            Duration::from_secs(3600),
            Duration::from_secs(86_400),
        );
        let service = AuthService::new(
            config.clone(),
            Arc::new(sea_orm::DatabaseConnection::Disconnected),
            None,
        );

        let now = Utc::now();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            name: None,
            roles: vec![],
            permissions: vec![],
            jti: Uuid::new_v4().to_string(),
            iat: (now - ChronoDuration::hours(2)).timestamp(),
            exp: (now - ChronoDuration::hours(1)).timestamp(),
            nbf: (now - ChronoDuration::hours(2)).timestamp(),
            iss: config.jwt_issuer.clone(),
            aud: config.jwt_audience.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        let result = service.validate_token(&token).await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }
}
