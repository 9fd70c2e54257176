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
use crate::services::wholesalers::{
    CreateWholesalerRequest, UpdateWholesalerRequest, WholesalerResponse,
};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Permission-gated router for the wholesaler endpoints
pub fn wholesalers_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/wholesalers", get(list_wholesalers))
        .route("/wholesalers/:id", get(get_wholesaler))
        .with_permission(perm::WHOLESALERS_READ);
    let create = Router::new()
        .route("/wholesalers", post(create_wholesaler))
        .with_permission(perm::WHOLESALERS_CREATE);
    let update = Router::new()
        .route("/wholesalers/:id", put(update_wholesaler))
        .with_permission(perm::WHOLESALERS_UPDATE);
    let remove = Router::new()
        .route("/wholesalers/:id", delete(delete_wholesaler))
        .with_permission(perm::WHOLESALERS_DELETE);

    Router::new().merge(read).merge(create).merge(update).merge(remove)
}

/// List wholesalers with pagination
#[utoipa::path(
    get,
    path = "/api/v1/wholesalers",
    summary = "List wholesalers",
    description = "Get a paginated list of wholesalers, alphabetically",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
        ("search" = Option<String>, Query, description = "Filter by name"),
    ),
    responses(
        (status = 200, description = "Wholesalers retrieved successfully", body = ApiResponse<PaginatedResponse<WholesalerResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_wholesalers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<WholesalerResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::WHOLESALERS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read wholesalers".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .wholesalers
        .list_wholesalers(page, per_page, query.search)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.wholesalers,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a wholesaler by ID
#[utoipa::path(
    get,
    path = "/api/v1/wholesalers/{id}",
    summary = "Get wholesaler",
    description = "Get a single wholesaler",
    params(("id" = Uuid, Path, description = "Wholesaler ID")),
    responses(
        (status = 200, description = "Wholesaler retrieved successfully", body = ApiResponse<WholesalerResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Wholesaler not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_wholesaler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<WholesalerResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::WHOLESALERS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read wholesalers".to_string(),
        ));
    }

    let wholesaler = state
        .services
        .wholesalers
        .get_wholesaler(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Wholesaler {} not found", id)))?;

    Ok(Json(ApiResponse::success(wholesaler)))
}

/// Create a wholesaler
#[utoipa::path(
    post,
    path = "/api/v1/wholesalers",
    summary = "Create wholesaler",
    description = "Create a new wholesaler",
    request_body = CreateWholesalerRequest,
    responses(
        (status = 201, description = "Wholesaler created successfully", body = ApiResponse<WholesalerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_wholesaler(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateWholesalerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WholesalerResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::WHOLESALERS_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create wholesalers".to_string(),
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

    let wholesaler = state.services.wholesalers.create_wholesaler(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(wholesaler))))
}

/// Update a wholesaler
#[utoipa::path(
    put,
    path = "/api/v1/wholesalers/{id}",
    summary = "Update wholesaler",
    description = "Update a wholesaler",
    params(("id" = Uuid, Path, description = "Wholesaler ID")),
    request_body = UpdateWholesalerRequest,
    responses(
        (status = 200, description = "Wholesaler updated successfully", body = ApiResponse<WholesalerResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Wholesaler not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_wholesaler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateWholesalerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<WholesalerResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::WHOLESALERS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update wholesalers".to_string(),
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

    let wholesaler = state
        .services
        .wholesalers
        .update_wholesaler(id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(wholesaler))))
}

/// Delete a wholesaler
#[utoipa::path(
    delete,
    path = "/api/v1/wholesalers/{id}",
    summary = "Delete wholesaler",
    description = "Delete a wholesaler. Documents that referenced it keep working with no wholesaler.",
    params(("id" = Uuid, Path, description = "Wholesaler ID")),
    responses(
        (status = 204, description = "Wholesaler deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Wholesaler not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_wholesaler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::WHOLESALERS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete wholesalers".to_string(),
        ));
    }

    state.services.wholesalers.delete_wholesaler(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
