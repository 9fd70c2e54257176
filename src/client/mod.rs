//! Typed HTTP client for the Aurum API.
//!
//! Built for back-office tooling and integration tests: wraps the `/api/v1`
//! surface in typed calls, signs every request with the bearer token held by
//! a shared [`TokenCoordinator`], and when the server answers 401 runs one
//! coordinated refresh and retries the request once. Concurrent callers
//! sharing a coordinator never stampede the refresh endpoint.

pub mod token_sync;

pub use token_sync::{TokenCoordinator, DEFAULT_SAFETY_WINDOW};

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::auth::{AuthUser, LoginCredentials, LogoutRequest, RefreshTokenRequest, TokenPair};
use crate::errors::ErrorResponse;
use crate::services::access::{
    CreatePermissionGroupRequest, CreatePermissionRequest, CreateRoleRequest,
    PermissionGroupResponse, PermissionResponse, RoleResponse, UpdatePermissionGroupRequest,
    UpdatePermissionRequest, UpdateRoleRequest,
};
use crate::services::categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::services::documents::{
    CreateDocumentRequest, DocumentResponse, LineResponse, UpdateDocumentRequest,
    UpdateLineStatusRequest,
};
use crate::services::gold_rates::{GoldRateResponse, RecordGoldRateRequest, UpdateGoldRateRequest};
use crate::services::products::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::services::users::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::services::wholesalers::{
    CreateWholesalerRequest, UpdateWholesalerRequest, WholesalerResponse,
};
use crate::valuation::DocumentKind;
use crate::{ApiResponse, PaginatedResponse};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("server answered {status}: {message}")]
    Api { status: StatusCode, message: String },
    #[error("response body did not match the expected shape: {0}")]
    Decode(String),
}

/// What a failed optimistic delete left behind.
#[derive(Debug)]
pub struct DeleteRecovery {
    /// The error the server answered the delete with.
    pub error: ClientError,
    /// Fresh first page of the collection, when the reload itself worked.
    /// Callers that dropped the row before confirmation swap this in.
    pub reloaded: Option<PaginatedResponse<DocumentResponse>>,
}

/// Typed client over one credential set.
///
/// Cheap to clone; clones share the underlying connection pool and the
/// token coordinator.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<TokenCoordinator>,
}

impl ApiClient {
    /// Build a client around an already issued token pair.
    pub fn new(base_url: Url, tokens: TokenPair) -> Result<Self, ClientError> {
        Self::with_coordinator(base_url, Arc::new(TokenCoordinator::new(tokens)))
    }

    /// Build a client sharing a coordinator with other holders, so all of
    /// them rotate credentials together.
    pub fn with_coordinator(
        base_url: Url,
        tokens: Arc<TokenCoordinator>,
    ) -> Result<Self, ClientError> {
        let (http, base_url) = Self::build_parts(base_url)?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Authenticate with username and password and wrap the issued pair.
    pub async fn login(
        base_url: Url,
        username: &str,
        password: &str,
    ) -> Result<Self, ClientError> {
        let (http, base_url) = Self::build_parts(base_url)?;
        let response = http
            .post(base_url.join("auth/login")?)
            .json(&LoginCredentials {
                username: username.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;
        let pair: TokenPair = Self::decode_bare(response).await?;
        Ok(Self {
            http,
            base_url,
            tokens: Arc::new(TokenCoordinator::new(pair)),
        })
    }

    fn build_parts(mut base_url: Url) -> Result<(reqwest::Client, Url), ClientError> {
        // Url::join replaces the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()?;
        Ok((http, base_url))
    }

    /// The coordinator holding this client's credentials.
    pub fn tokens(&self) -> &Arc<TokenCoordinator> {
        &self.tokens
    }

    /// The profile behind the current access token.
    pub async fn me(&self) -> Result<AuthUser, ClientError> {
        let url = self.base_url.join("auth/me")?;
        let response = self
            .execute_with_refresh(|http| http.get(url.clone()))
            .await?;
        Self::decode_bare(response).await
    }

    /// Revoke the current session server side. No refresh is attempted on
    /// 401 since a dead token has nothing left to log out.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let pair = self.tokens.current();
        let response = self
            .http
            .post(self.base_url.join("auth/logout")?)
            .bearer_auth(&pair.access_token)
            .json(&LogoutRequest {
                refresh_token: Some(pair.refresh_token.clone()),
            })
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    // Categories

    pub async fn list_categories(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<PaginatedResponse<CategoryResponse>, ClientError> {
        let query = Self::page_query(page, page_size, search);
        self.get_json("categories", &query).await
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryResponse, ClientError> {
        self.get_json(&format!("categories/{id}"), &[]).await
    }

    pub async fn create_category(
        &self,
        request: &CreateCategoryRequest,
    ) -> Result<CategoryResponse, ClientError> {
        self.post_json("categories", request).await
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        request: &UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ClientError> {
        self.put_json(&format!("categories/{id}"), request).await
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("categories/{id}")).await
    }

    // Products

    pub async fn list_products(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
        category_id: Option<Uuid>,
    ) -> Result<PaginatedResponse<ProductResponse>, ClientError> {
        let mut query = Self::page_query(page, page_size, search);
        if let Some(category_id) = category_id {
            query.push(("category_id", category_id.to_string()));
        }
        self.get_json("products", &query).await
    }

    pub async fn get_product(&self, id: Uuid) -> Result<ProductResponse, ClientError> {
        self.get_json(&format!("products/{id}"), &[]).await
    }

    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<ProductResponse, ClientError> {
        self.post_json("products", request).await
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        request: &UpdateProductRequest,
    ) -> Result<ProductResponse, ClientError> {
        self.put_json(&format!("products/{id}"), request).await
    }

    pub async fn delete_product(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("products/{id}")).await
    }

    // Wholesalers

    pub async fn list_wholesalers(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<PaginatedResponse<WholesalerResponse>, ClientError> {
        let query = Self::page_query(page, page_size, search);
        self.get_json("wholesalers", &query).await
    }

    pub async fn get_wholesaler(&self, id: Uuid) -> Result<WholesalerResponse, ClientError> {
        self.get_json(&format!("wholesalers/{id}"), &[]).await
    }

    pub async fn create_wholesaler(
        &self,
        request: &CreateWholesalerRequest,
    ) -> Result<WholesalerResponse, ClientError> {
        self.post_json("wholesalers", request).await
    }

    pub async fn update_wholesaler(
        &self,
        id: Uuid,
        request: &UpdateWholesalerRequest,
    ) -> Result<WholesalerResponse, ClientError> {
        self.put_json(&format!("wholesalers/{id}"), request).await
    }

    pub async fn delete_wholesaler(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("wholesalers/{id}")).await
    }

    // Gold rates

    pub async fn list_gold_rates(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<GoldRateResponse>, ClientError> {
        let query = Self::page_query(page, page_size, None);
        self.get_json("gold-rates", &query).await
    }

    /// The most recently recorded rate; new documents default to it.
    pub async fn latest_gold_rate(&self) -> Result<GoldRateResponse, ClientError> {
        self.get_json("gold-rates/latest", &[]).await
    }

    pub async fn get_gold_rate(&self, id: Uuid) -> Result<GoldRateResponse, ClientError> {
        self.get_json(&format!("gold-rates/{id}"), &[]).await
    }

    pub async fn record_gold_rate(
        &self,
        request: &RecordGoldRateRequest,
    ) -> Result<GoldRateResponse, ClientError> {
        self.post_json("gold-rates", request).await
    }

    pub async fn update_gold_rate(
        &self,
        id: Uuid,
        request: &UpdateGoldRateRequest,
    ) -> Result<GoldRateResponse, ClientError> {
        self.put_json(&format!("gold-rates/{id}"), request).await
    }

    pub async fn delete_gold_rate(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("gold-rates/{id}")).await
    }

    // Users

    pub async fn list_users(
        &self,
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Result<PaginatedResponse<UserResponse>, ClientError> {
        let query = Self::page_query(page, page_size, search);
        self.get_json("users", &query).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserResponse, ClientError> {
        self.get_json(&format!("users/{id}"), &[]).await
    }

    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<UserResponse, ClientError> {
        self.post_json("users", request).await
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        request: &UpdateUserRequest,
    ) -> Result<UserResponse, ClientError> {
        self.put_json(&format!("users/{id}"), request).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("users/{id}")).await
    }

    // Roles, permissions, permission groups

    pub async fn list_roles(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<RoleResponse>, ClientError> {
        let query = Self::page_query(page, page_size, None);
        self.get_json("roles", &query).await
    }

    pub async fn get_role(&self, id: Uuid) -> Result<RoleResponse, ClientError> {
        self.get_json(&format!("roles/{id}"), &[]).await
    }

    pub async fn create_role(
        &self,
        request: &CreateRoleRequest,
    ) -> Result<RoleResponse, ClientError> {
        self.post_json("roles", request).await
    }

    pub async fn update_role(
        &self,
        id: Uuid,
        request: &UpdateRoleRequest,
    ) -> Result<RoleResponse, ClientError> {
        self.put_json(&format!("roles/{id}"), request).await
    }

    pub async fn delete_role(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("roles/{id}")).await
    }

    pub async fn list_permissions(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<PermissionResponse>, ClientError> {
        let query = Self::page_query(page, page_size, None);
        self.get_json("permissions", &query).await
    }

    pub async fn get_permission(&self, id: Uuid) -> Result<PermissionResponse, ClientError> {
        self.get_json(&format!("permissions/{id}"), &[]).await
    }

    pub async fn create_permission(
        &self,
        request: &CreatePermissionRequest,
    ) -> Result<PermissionResponse, ClientError> {
        self.post_json("permissions", request).await
    }

    pub async fn update_permission(
        &self,
        id: Uuid,
        request: &UpdatePermissionRequest,
    ) -> Result<PermissionResponse, ClientError> {
        self.put_json(&format!("permissions/{id}"), request).await
    }

    pub async fn delete_permission(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("permissions/{id}")).await
    }

    pub async fn list_permission_groups(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<PermissionGroupResponse>, ClientError> {
        let query = Self::page_query(page, page_size, None);
        self.get_json("permission-groups", &query).await
    }

    pub async fn get_permission_group(
        &self,
        id: Uuid,
    ) -> Result<PermissionGroupResponse, ClientError> {
        self.get_json(&format!("permission-groups/{id}"), &[]).await
    }

    pub async fn create_permission_group(
        &self,
        request: &CreatePermissionGroupRequest,
    ) -> Result<PermissionGroupResponse, ClientError> {
        self.post_json("permission-groups", request).await
    }

    pub async fn update_permission_group(
        &self,
        id: Uuid,
        request: &UpdatePermissionGroupRequest,
    ) -> Result<PermissionGroupResponse, ClientError> {
        self.put_json(&format!("permission-groups/{id}"), request)
            .await
    }

    pub async fn delete_permission_group(&self, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("permission-groups/{id}"))
            .await
    }

    // Documents: scenarios, orders and supplies share one shape

    pub async fn list_documents(
        &self,
        kind: DocumentKind,
        page: u64,
        page_size: u64,
    ) -> Result<PaginatedResponse<DocumentResponse>, ClientError> {
        let query = Self::page_query(page, page_size, None);
        self.get_json(kind.collection_name(), &query).await
    }

    pub async fn get_document(
        &self,
        kind: DocumentKind,
        id: Uuid,
    ) -> Result<DocumentResponse, ClientError> {
        self.get_json(&format!("{}/{id}", kind.collection_name()), &[])
            .await
    }

    pub async fn create_document(
        &self,
        kind: DocumentKind,
        request: &CreateDocumentRequest,
    ) -> Result<DocumentResponse, ClientError> {
        self.post_json(kind.collection_name(), request).await
    }

    pub async fn update_document(
        &self,
        kind: DocumentKind,
        id: Uuid,
        request: &UpdateDocumentRequest,
    ) -> Result<DocumentResponse, ClientError> {
        self.put_json(&format!("{}/{id}", kind.collection_name()), request)
            .await
    }

    pub async fn delete_document(&self, kind: DocumentKind, id: Uuid) -> Result<(), ClientError> {
        self.delete_resource(&format!("{}/{id}", kind.collection_name()))
            .await
    }

    pub async fn update_order_line_status(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        request: &UpdateLineStatusRequest,
    ) -> Result<LineResponse, ClientError> {
        self.put_json(&format!("orders/{order_id}/lines/{line_id}/status"), request)
            .await
    }

    /// Delete a document, reloading the collection when the server refuses.
    ///
    /// UIs drop the row before the server confirms; when the delete then
    /// fails their view no longer matches the server. The recovery carries
    /// the server's first page so the caller reconciles instead of guessing.
    pub async fn delete_document_reconciling(
        &self,
        kind: DocumentKind,
        id: Uuid,
        page_size: u64,
    ) -> Result<(), DeleteRecovery> {
        match self.delete_document(kind, id).await {
            Ok(()) => Ok(()),
            Err(error) => {
                let reloaded = self.list_documents(kind, 1, page_size).await.ok();
                Err(DeleteRecovery { error, reloaded })
            }
        }
    }

    // Plumbing

    fn api(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(&format!("api/v1/{path}"))?)
    }

    fn page_query(
        page: u64,
        page_size: u64,
        search: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("page", page.to_string()),
            ("pageSize", page_size.to_string()),
        ];
        if let Some(term) = search {
            query.push(("search", term.to_string()));
        }
        query
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<T, ClientError> {
        let url = self.api(path)?;
        let response = self
            .execute_with_refresh(|http| http.get(url.clone()).query(query))
            .await?;
        Self::decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.api(path)?;
        let response = self
            .execute_with_refresh(|http| http.post(url.clone()).json(body))
            .await?;
        Self::decode(response).await
    }

    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.api(path)?;
        let response = self
            .execute_with_refresh(|http| http.put(url.clone()).json(body))
            .await?;
        Self::decode(response).await
    }

    async fn delete_resource(&self, path: &str) -> Result<(), ClientError> {
        let url = self.api(path)?;
        let response = self
            .execute_with_refresh(|http| http.delete(url.clone()))
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response).await)
        }
    }

    /// Send the request with the current token; on 401 run the coordinated
    /// refresh and retry once with the new pair. A second 401 surfaces as a
    /// plain API error.
    async fn execute_with_refresh<F>(&self, build: F) -> Result<Response, ClientError>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let token = self.tokens.current();
        let response = build(&self.http)
            .bearer_auth(&token.access_token)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let refreshed = self.coordinated_refresh(&token.access_token).await?;
        Ok(build(&self.http)
            .bearer_auth(&refreshed.access_token)
            .send()
            .await?)
    }

    async fn coordinated_refresh(&self, presented_access: &str) -> Result<TokenPair, ClientError> {
        let http = self.http.clone();
        let refresh_url = self.base_url.join("auth/refresh")?;
        self.tokens
            .refresh_with(presented_access, move |stale| async move {
                let response = http
                    .post(refresh_url)
                    .json(&RefreshTokenRequest {
                        refresh_token: stale.refresh_token,
                    })
                    .send()
                    .await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ClientError::Auth(format!(
                        "token refresh rejected with status {status}"
                    )));
                }
                Ok(response.json::<TokenPair>().await?)
            })
            .await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        let envelope: ApiResponse<T> = response.json().await?;
        envelope
            .data
            .ok_or_else(|| ClientError::Decode("success response carried no data".to_string()))
    }

    /// Auth endpoints answer with plain bodies, not the response envelope.
    async fn decode_bare<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(status, response).await);
        }
        Ok(response.json().await?)
    }

    /// The server answers errors two ways: middleware and service failures
    /// as [`ErrorResponse`], validation failures as an error-shaped
    /// envelope. Fold both into one message.
    async fn error_from(status: StatusCode, response: Response) -> ClientError {
        let fallback = || {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        };
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(_) => {
                return ClientError::Api {
                    status,
                    message: fallback(),
                }
            }
        };
        if let Ok(error) = serde_json::from_slice::<ErrorResponse>(&body) {
            return ClientError::Api {
                status,
                message: error.message,
            };
        }
        if let Ok(envelope) = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&body) {
            let message = envelope
                .errors
                .filter(|errors| !errors.is_empty())
                .map(|errors| errors.join("; "))
                .or(envelope.message)
                .unwrap_or_else(fallback);
            return ClientError::Api { status, message };
        }
        ClientError::Api {
            status,
            message: fallback(),
        }
    }
}
