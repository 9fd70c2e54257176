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
use crate::services::categories::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Permission-gated router for the category endpoints
pub fn categories_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
        .with_permission(perm::CATEGORIES_READ);
    let create = Router::new()
        .route("/categories", post(create_category))
        .with_permission(perm::CATEGORIES_CREATE);
    let update = Router::new()
        .route("/categories/:id", put(update_category))
        .with_permission(perm::CATEGORIES_UPDATE);
    let remove = Router::new()
        .route("/categories/:id", delete(delete_category))
        .with_permission(perm::CATEGORIES_DELETE);

    Router::new().merge(read).merge(create).merge(update).merge(remove)
}

/// List categories with pagination
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    description = "Get a paginated list of product categories, alphabetically",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Filter by name"),
    ),
    responses(
        (status = 200, description = "Categories retrieved successfully", body = ApiResponse<PaginatedResponse<CategoryResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<CategoryResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::CATEGORIES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read categories".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .categories
        .list_categories(page, per_page, query.search)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.categories,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a category by ID
#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    summary = "Get category",
    description = "Get a single product category",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category retrieved successfully", body = ApiResponse<CategoryResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<CategoryResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::CATEGORIES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read categories".to_string(),
        ));
    }

    let category = state
        .services
        .categories
        .get_category(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))?;

    Ok(Json(ApiResponse::success(category)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    summary = "Create category",
    description = "Create a new product category",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::CATEGORIES_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create categories".to_string(),
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

    let category = state.services.categories.create_category(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(category))))
}

/// Update a category
#[utoipa::path(
    put,
    path = "/api/v1/categories/{id}",
    summary = "Update category",
    description = "Update an existing product category",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated successfully", body = ApiResponse<CategoryResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::CATEGORIES_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update categories".to_string(),
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

    let category = state
        .services
        .categories
        .update_category(id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(category))))
}

/// Delete a category
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{id}",
    summary = "Delete category",
    description = "Delete a product category. Products referencing it keep working with no category.",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::CATEGORIES_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete categories".to_string(),
        ));
    }

    state.services.categories.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
