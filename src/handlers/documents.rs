//! Handlers for the three document collections.
//!
//! Scenarios, orders and supplies share one storage model and one valuation
//! pipeline; only the kind and the permissions differ. The annotated handlers
//! here are thin wrappers over kind-generic helpers so each collection gets
//! its own OpenAPI surface without three copies of the logic.

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
use crate::services::documents::{
    CreateDocumentRequest, DocumentResponse, LineResponse, UpdateDocumentRequest,
    UpdateLineStatusRequest,
};
use crate::valuation::DocumentKind;
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Permission-gated router for scenarios, orders and supplies
pub fn documents_routes() -> Router<AppState> {
    let scenarios_read = Router::new()
        .route("/scenarios", get(list_scenarios))
        .route("/scenarios/:id", get(get_scenario))
        .with_permission(perm::SCENARIOS_READ);
    let scenarios_create = Router::new()
        .route("/scenarios", post(create_scenario))
        .with_permission(perm::SCENARIOS_CREATE);
    let scenarios_update = Router::new()
        .route("/scenarios/:id", put(update_scenario))
        .with_permission(perm::SCENARIOS_UPDATE);
    let scenarios_remove = Router::new()
        .route("/scenarios/:id", delete(delete_scenario))
        .with_permission(perm::SCENARIOS_DELETE);

    let orders_read = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/:id", get(get_order))
        .with_permission(perm::ORDERS_READ);
    let orders_create = Router::new()
        .route("/orders", post(create_order))
        .with_permission(perm::ORDERS_CREATE);
    let orders_update = Router::new()
        .route("/orders/:id", put(update_order))
        .route("/orders/:id/lines/:line_id/status", put(update_order_line_status))
        .with_permission(perm::ORDERS_UPDATE);
    let orders_remove = Router::new()
        .route("/orders/:id", delete(delete_order))
        .with_permission(perm::ORDERS_DELETE);

    let supplies_read = Router::new()
        .route("/supplies", get(list_supplies))
        .route("/supplies/:id", get(get_supply))
        .with_permission(perm::SUPPLIES_READ);
    let supplies_create = Router::new()
        .route("/supplies", post(create_supply))
        .with_permission(perm::SUPPLIES_CREATE);
    let supplies_update = Router::new()
        .route("/supplies/:id", put(update_supply))
        .with_permission(perm::SUPPLIES_UPDATE);
    let supplies_remove = Router::new()
        .route("/supplies/:id", delete(delete_supply))
        .with_permission(perm::SUPPLIES_DELETE);

    Router::new()
        .merge(scenarios_read)
        .merge(scenarios_create)
        .merge(scenarios_update)
        .merge(scenarios_remove)
        .merge(orders_read)
        .merge(orders_create)
        .merge(orders_update)
        .merge(orders_remove)
        .merge(supplies_read)
        .merge(supplies_create)
        .merge(supplies_update)
        .merge(supplies_remove)
}

async fn list_kind(
    state: AppState,
    query: ListQuery,
    auth_user: AuthUser,
    kind: DocumentKind,
    permission: &str,
) -> Result<Json<ApiResponse<PaginatedResponse<DocumentResponse>>>, ServiceError> {
    if !auth_user.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions to read {}",
            kind.collection_name()
        )));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .documents
        .list_documents(kind, page, per_page)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.documents,
        result.total,
        page,
        per_page,
    ))))
}

async fn get_kind(
    state: AppState,
    id: Uuid,
    auth_user: AuthUser,
    kind: DocumentKind,
    permission: &str,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    if !auth_user.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions to read {}",
            kind.collection_name()
        )));
    }

    let document = state
        .services
        .documents
        .get_document(kind, id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("{} {} not found", kind.display_name(), id))
        })?;

    Ok(Json(ApiResponse::success(document)))
}

async fn create_kind(
    state: AppState,
    auth_user: AuthUser,
    request: CreateDocumentRequest,
    kind: DocumentKind,
    permission: &str,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    if !auth_user.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions to create {}",
            kind.collection_name()
        )));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let document = state.services.documents.create_document(kind, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(document))))
}

async fn update_kind(
    state: AppState,
    id: Uuid,
    auth_user: AuthUser,
    request: UpdateDocumentRequest,
    kind: DocumentKind,
    permission: &str,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    if !auth_user.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions to update {}",
            kind.collection_name()
        )));
    }

    if let Err(validation_errors) = request.validate() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::validation_errors(flatten_validation_errors(
                &validation_errors,
            ))),
        ));
    }

    let document = state
        .services
        .documents
        .update_document(kind, id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(document))))
}

async fn delete_kind(
    state: AppState,
    id: Uuid,
    auth_user: AuthUser,
    kind: DocumentKind,
    permission: &str,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(permission) {
        return Err(ServiceError::Forbidden(format!(
            "Insufficient permissions to delete {}",
            kind.collection_name()
        )));
    }

    state.services.documents.delete_document(kind, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List scenarios
#[utoipa::path(
    get,
    path = "/api/v1/scenarios",
    summary = "List scenarios",
    description = "Get a paginated list of scenario documents, newest first. Lines are omitted; fetch a single document for them.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Scenarios retrieved successfully", body = ApiResponse<PaginatedResponse<DocumentResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_scenarios(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<DocumentResponse>>>, ServiceError> {
    list_kind(state, query, auth_user, DocumentKind::Scenario, perm::SCENARIOS_READ).await
}

/// Get a scenario with its lines
#[utoipa::path(
    get,
    path = "/api/v1/scenarios/{id}",
    summary = "Get scenario",
    description = "Get a scenario document with its valued lines and totals",
    params(("id" = Uuid, Path, description = "Scenario ID")),
    responses(
        (status = 200, description = "Scenario retrieved successfully", body = ApiResponse<DocumentResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Scenario not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    get_kind(state, id, auth_user, DocumentKind::Scenario, perm::SCENARIOS_READ).await
}

/// Create a scenario
#[utoipa::path(
    post,
    path = "/api/v1/scenarios",
    summary = "Create scenario",
    description = "Create a scenario document. Lines are normalized and valued at the agreed rate; omitting the rate pins the latest recorded one.",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Scenario created successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_scenario(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    create_kind(state, auth_user, request, DocumentKind::Scenario, perm::SCENARIOS_CREATE).await
}

/// Update a scenario
#[utoipa::path(
    put,
    path = "/api/v1/scenarios/{id}",
    summary = "Update scenario",
    description = "Replace a scenario's header and lines. A submission identical to the stored document is skipped without a write.",
    params(("id" = Uuid, Path, description = "Scenario ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Scenario updated successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Scenario not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_scenario(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    update_kind(state, id, auth_user, request, DocumentKind::Scenario, perm::SCENARIOS_UPDATE).await
}

/// Delete a scenario
#[utoipa::path(
    delete,
    path = "/api/v1/scenarios/{id}",
    summary = "Delete scenario",
    description = "Delete a scenario document and its lines",
    params(("id" = Uuid, Path, description = "Scenario ID")),
    responses(
        (status = 204, description = "Scenario deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Scenario not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    delete_kind(state, id, auth_user, DocumentKind::Scenario, perm::SCENARIOS_DELETE).await
}

/// List orders
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "Get a paginated list of order documents, newest first. Lines are omitted; fetch a single document for them.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Orders retrieved successfully", body = ApiResponse<PaginatedResponse<DocumentResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<DocumentResponse>>>, ServiceError> {
    list_kind(state, query, auth_user, DocumentKind::Order, perm::ORDERS_READ).await
}

/// Get an order with its lines
#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    description = "Get an order document with its valued lines, fulfillment statuses and totals",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order retrieved successfully", body = ApiResponse<DocumentResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    get_kind(state, id, auth_user, DocumentKind::Order, perm::ORDERS_READ).await
}

/// Create an order
#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Create order",
    description = "Create an order document. Outgoing product lines start in the to-be-ordered state.",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Order created successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_order(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    create_kind(state, auth_user, request, DocumentKind::Order, perm::ORDERS_CREATE).await
}

/// Update an order
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}",
    summary = "Update order",
    description = "Replace an order's header and lines. A submission identical to the stored document is skipped without a write.",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Order updated successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    update_kind(state, id, auth_user, request, DocumentKind::Order, perm::ORDERS_UPDATE).await
}

/// Delete an order
#[utoipa::path(
    delete,
    path = "/api/v1/orders/{id}",
    summary = "Delete order",
    description = "Delete an order document and its lines",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 204, description = "Order deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    delete_kind(state, id, auth_user, DocumentKind::Order, perm::ORDERS_DELETE).await
}

/// Update the fulfillment status of one order line
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/lines/{line_id}/status",
    summary = "Update order line status",
    description = "Move one outgoing product line through the fulfillment pipeline without touching the rest of the document",
    params(
        ("id" = Uuid, Path, description = "Order ID"),
        ("line_id" = Uuid, Path, description = "Line ID"),
    ),
    request_body = UpdateLineStatusRequest,
    responses(
        (status = 200, description = "Line status updated successfully", body = ApiResponse<LineResponse>),
        (status = 400, description = "Line does not carry a fulfillment status", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order or line not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_order_line_status(
    State(state): State<AppState>,
    Path((id, line_id)): Path<(Uuid, Uuid)>,
    auth_user: AuthUser,
    Json(request): Json<UpdateLineStatusRequest>,
) -> Result<Json<ApiResponse<LineResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::ORDERS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update orders".to_string(),
        ));
    }

    let line = state
        .services
        .documents
        .update_line_status(id, line_id, request)
        .await?;
    Ok(Json(ApiResponse::success(line)))
}

/// List supplies
#[utoipa::path(
    get,
    path = "/api/v1/supplies",
    summary = "List supplies",
    description = "Get a paginated list of supply documents, newest first. Lines are omitted; fetch a single document for them.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Supplies retrieved successfully", body = ApiResponse<PaginatedResponse<DocumentResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_supplies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<DocumentResponse>>>, ServiceError> {
    list_kind(state, query, auth_user, DocumentKind::Supply, perm::SUPPLIES_READ).await
}

/// Get a supply with its lines
#[utoipa::path(
    get,
    path = "/api/v1/supplies/{id}",
    summary = "Get supply",
    description = "Get a supply document with its valued lines and totals",
    params(("id" = Uuid, Path, description = "Supply ID")),
    responses(
        (status = 200, description = "Supply retrieved successfully", body = ApiResponse<DocumentResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supply not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<DocumentResponse>>, ServiceError> {
    get_kind(state, id, auth_user, DocumentKind::Supply, perm::SUPPLIES_READ).await
}

/// Create a supply
#[utoipa::path(
    post,
    path = "/api/v1/supplies",
    summary = "Create supply",
    description = "Create a supply document. Lines are normalized and valued at the agreed rate; omitting the rate pins the latest recorded one.",
    request_body = CreateDocumentRequest,
    responses(
        (status = 201, description = "Supply created successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_supply(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    create_kind(state, auth_user, request, DocumentKind::Supply, perm::SUPPLIES_CREATE).await
}

/// Update a supply
#[utoipa::path(
    put,
    path = "/api/v1/supplies/{id}",
    summary = "Update supply",
    description = "Replace a supply's header and lines. A submission identical to the stored document is skipped without a write.",
    params(("id" = Uuid, Path, description = "Supply ID")),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Supply updated successfully", body = ApiResponse<DocumentResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supply not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateDocumentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<DocumentResponse>>), ServiceError> {
    update_kind(state, id, auth_user, request, DocumentKind::Supply, perm::SUPPLIES_UPDATE).await
}

/// Delete a supply
#[utoipa::path(
    delete,
    path = "/api/v1/supplies/{id}",
    summary = "Delete supply",
    description = "Delete a supply document and its lines",
    params(("id" = Uuid, Path, description = "Supply ID")),
    responses(
        (status = 204, description = "Supply deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supply not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_supply(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    delete_kind(state, id, auth_user, DocumentKind::Supply, perm::SUPPLIES_DELETE).await
}
