use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;
use crate::services::products::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Extra list filters on top of [`ListQuery`]
#[derive(Debug, Deserialize)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
}

/// Permission-gated router for the product catalog endpoints
pub fn products_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .with_permission(perm::PRODUCTS_READ);
    let create = Router::new()
        .route("/products", post(create_product))
        .with_permission(perm::PRODUCTS_CREATE);
    let update = Router::new()
        .route("/products/:id", put(update_product))
        .with_permission(perm::PRODUCTS_UPDATE);
    let remove = Router::new()
        .route("/products/:id", delete(delete_product))
        .with_permission(perm::PRODUCTS_DELETE);

    Router::new().merge(read).merge(create).merge(update).merge(remove)
}

/// List catalog products with pagination and filtering
#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Get a paginated list of catalog products, alphabetically",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Filter by name"),
        ("category_id" = Option<Uuid>, Query, description = "Filter by category"),
    ),
    responses(
        (status = 200, description = "Products retrieved successfully", body = ApiResponse<PaginatedResponse<ProductResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<ProductFilter>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<ProductResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::PRODUCTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read products".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .products
        .list_products(page, per_page, query.search, filter.category_id)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.products,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    description = "Get a single catalog product",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product retrieved successfully", body = ApiResponse<ProductResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<ProductResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::PRODUCTS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read products".to_string(),
        ));
    }

    let product = state
        .services
        .products
        .get_product(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))?;

    Ok(Json(ApiResponse::success(product)))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/api/v1/products",
    summary = "Create product",
    description = "Create a new catalog product",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created successfully", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_product(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PRODUCTS_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create products".to_string(),
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

    let product = state.services.products.create_product(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(product))))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/v1/products/{id}",
    summary = "Update product",
    description = "Update a catalog product. Stored document lines keep the flags they were written with.",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated successfully", body = ApiResponse<ProductResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PRODUCTS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update products".to_string(),
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

    let product = state.services.products.update_product(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(product))))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/api/v1/products/{id}",
    summary = "Delete product",
    description = "Delete a catalog product. Historical document lines are untouched; they carry their own snapshot of the product's flags.",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::PRODUCTS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete products".to_string(),
        ));
    }

    state.services.products.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
