use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::consts as perm;
use crate::auth::AuthRouterExt;
use crate::services::gold_rates::{
    GoldRateResponse, RecordGoldRateRequest, UpdateGoldRateRequest,
};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

/// Permission-gated router for the gold rate history endpoints
pub fn gold_rates_routes() -> Router<AppState> {
    let read = Router::new()
        .route("/gold-rates", get(list_gold_rates))
        .route("/gold-rates/latest", get(latest_gold_rate))
        .route("/gold-rates/:id", get(get_gold_rate))
        .with_permission(perm::GOLD_RATES_READ);
    let create = Router::new()
        .route("/gold-rates", post(record_gold_rate))
        .with_permission(perm::GOLD_RATES_CREATE);
    let update = Router::new()
        .route("/gold-rates/:id", put(update_gold_rate))
        .with_permission(perm::GOLD_RATES_UPDATE);
    let remove = Router::new()
        .route("/gold-rates/:id", delete(delete_gold_rate))
        .with_permission(perm::GOLD_RATES_DELETE);

    Router::new().merge(read).merge(create).merge(update).merge(remove)
}

/// List recorded gold rates, newest first
#[utoipa::path(
    get,
    path = "/api/v1/gold-rates",
    summary = "List gold rates",
    description = "Get the recorded 24k gold rate history, newest first",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Gold rates retrieved successfully", body = ApiResponse<PaginatedResponse<GoldRateResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_gold_rates(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<GoldRateResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read gold rates".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state.services.gold_rates.list_rates(page, per_page).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.rates,
        result.total,
        page,
        per_page,
    ))))
}

/// Get the most recently recorded gold rate
#[utoipa::path(
    get,
    path = "/api/v1/gold-rates/latest",
    summary = "Latest gold rate",
    description = "Get the most recently recorded 24k gold rate. New documents default their agreed rate to this value.",
    responses(
        (status = 200, description = "Latest gold rate retrieved successfully", body = ApiResponse<GoldRateResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "No gold rate recorded yet", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn latest_gold_rate(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<GoldRateResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read gold rates".to_string(),
        ));
    }

    let rate = state
        .services
        .gold_rates
        .latest_rate()
        .await?
        .ok_or_else(|| ServiceError::NotFound("No gold rate recorded yet".to_string()))?;

    Ok(Json(ApiResponse::success(rate)))
}

/// Get a gold rate by ID
#[utoipa::path(
    get,
    path = "/api/v1/gold-rates/{id}",
    summary = "Get gold rate",
    description = "Get a single recorded gold rate",
    params(("id" = Uuid, Path, description = "Gold rate ID")),
    responses(
        (status = 200, description = "Gold rate retrieved successfully", body = ApiResponse<GoldRateResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Gold rate not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_gold_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<GoldRateResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read gold rates".to_string(),
        ));
    }

    let rate = state
        .services
        .gold_rates
        .get_rate(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Gold rate {} not found", id)))?;

    Ok(Json(ApiResponse::success(rate)))
}

/// Record a gold rate
#[utoipa::path(
    post,
    path = "/api/v1/gold-rates",
    summary = "Record gold rate",
    description = "Record a 24k gold rate. Existing documents are not re-valued; each one pins the rate it was saved with.",
    request_body = RecordGoldRateRequest,
    responses(
        (status = 201, description = "Gold rate recorded successfully", body = ApiResponse<GoldRateResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn record_gold_rate(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<RecordGoldRateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoldRateResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to record gold rates".to_string(),
        ));
    }

    let rate = state.services.gold_rates.record_rate(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(rate))))
}

/// Update a gold rate
#[utoipa::path(
    put,
    path = "/api/v1/gold-rates/{id}",
    summary = "Update gold rate",
    description = "Correct a recorded gold rate",
    params(("id" = Uuid, Path, description = "Gold rate ID")),
    request_body = UpdateGoldRateRequest,
    responses(
        (status = 200, description = "Gold rate updated successfully", body = ApiResponse<GoldRateResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Gold rate not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_gold_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateGoldRateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GoldRateResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update gold rates".to_string(),
        ));
    }

    let rate = state.services.gold_rates.update_rate(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(rate))))
}

/// Delete a gold rate
#[utoipa::path(
    delete,
    path = "/api/v1/gold-rates/{id}",
    summary = "Delete gold rate",
    description = "Delete a recorded gold rate from the history",
    params(("id" = Uuid, Path, description = "Gold rate ID")),
    responses(
        (status = 204, description = "Gold rate deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Gold rate not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_gold_rate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::GOLD_RATES_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete gold rates".to_string(),
        ));
    }

    state.services.gold_rates.delete_rate(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
