use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;
use crate::services::users::{CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Permission-gated router for the user account endpoints
pub fn users_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user))
        .with_permission(perm::USERS_READ);
    let create = Router::new()
        .route("/users", post(create_user))
        .with_permission(perm::USERS_CREATE);
    let update = Router::new()
        .route("/users/:id", put(update_user))
        .with_permission(perm::USERS_UPDATE);
    let remove = Router::new()
        .route("/users/:id", delete(delete_user))
        .with_permission(perm::USERS_DELETE);

    Router::new().merge(read).merge(create).merge(update).merge(remove)
}

/// List user accounts with pagination
#[utoipa::path(
    get,
    path = "/api/v1/users",
    summary = "List users",
    description = "Get a paginated list of user accounts with their roles",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Filter by username or display name"),
    ),
    responses(
        (status = 200, description = "Users retrieved successfully", body = ApiResponse<PaginatedResponse<UserResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<UserResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::USERS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read users".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .users
        .list_users(page, per_page, query.search)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.users,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    summary = "Get user",
    description = "Get a single user account with its roles",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User retrieved successfully", body = ApiResponse<UserResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::USERS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read users".to_string(),
        ));
    }

    let user = state
        .services
        .users
        .get_user(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", id)))?;

    Ok(Json(ApiResponse::success(user)))
}

/// Create a user account
#[utoipa::path(
    post,
    path = "/api/v1/users",
    summary = "Create user",
    description = "Create a user account with role assignments. The username cannot be changed later.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Username already taken", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::USERS_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create users".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let user = state.services.users.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// Update a user account
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    summary = "Update user",
    description = "Update a user's display name, password, active flag and role assignments. Omitting the password keeps the stored hash.",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::USERS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update users".to_string(),
        ));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let user = state.services.users.update_user(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(user))))
}

/// Delete a user account
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    summary = "Delete user",
    description = "Delete a user account. Its refresh tokens and role assignments go with it.",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::USERS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete users".to_string(),
        ));
    }

    state.services.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
