//! Handlers for roles, permissions and permission groups.
//!
//! These three resources share one handler module because they form a single
//! access-control surface; the routers are still gated per resource.

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
use crate::services::access::{
    CreatePermissionGroupRequest, CreatePermissionRequest, CreateRoleRequest,
    PermissionGroupResponse, PermissionResponse, RoleResponse, UpdatePermissionGroupRequest,
    UpdatePermissionRequest, UpdateRoleRequest,
};
use crate::{
    auth::AuthUser, errors::ServiceError, ApiResponse, AppState, ListQuery, PaginatedResponse,
};

use super::common::flatten_validation_errors;

/// Permission-gated router for roles, permissions and permission groups
pub fn access_routes() -> Router<AppState> {
    let roles_read = Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:id", get(get_role))
        .with_permission(perm::ROLES_READ);
    let roles_create = Router::new()
        .route("/roles", post(create_role))
        .with_permission(perm::ROLES_CREATE);
    let roles_update = Router::new()
        .route("/roles/:id", put(update_role))
        .with_permission(perm::ROLES_UPDATE);
    let roles_remove = Router::new()
        .route("/roles/:id", delete(delete_role))
        .with_permission(perm::ROLES_DELETE);

    let perms_read = Router::new()
        .route("/permissions", get(list_permissions))
        .route("/permissions/:id", get(get_permission))
        .with_permission(perm::PERMISSIONS_READ);
    let perms_create = Router::new()
        .route("/permissions", post(create_permission))
        .with_permission(perm::PERMISSIONS_CREATE);
    let perms_update = Router::new()
        .route("/permissions/:id", put(update_permission))
        .with_permission(perm::PERMISSIONS_UPDATE);
    let perms_remove = Router::new()
        .route("/permissions/:id", delete(delete_permission))
        .with_permission(perm::PERMISSIONS_DELETE);

    let groups_read = Router::new()
        .route("/permission-groups", get(list_permission_groups))
        .route("/permission-groups/:id", get(get_permission_group))
        .with_permission(perm::PERMISSION_GROUPS_READ);
    let groups_create = Router::new()
        .route("/permission-groups", post(create_permission_group))
        .with_permission(perm::PERMISSION_GROUPS_CREATE);
    let groups_update = Router::new()
        .route("/permission-groups/:id", put(update_permission_group))
        .with_permission(perm::PERMISSION_GROUPS_UPDATE);
    let groups_remove = Router::new()
        .route("/permission-groups/:id", delete(delete_permission_group))
        .with_permission(perm::PERMISSION_GROUPS_DELETE);

    Router::new()
        .merge(roles_read)
        .merge(roles_create)
        .merge(roles_update)
        .merge(roles_remove)
        .merge(perms_read)
        .merge(perms_create)
        .merge(perms_update)
        .merge(perms_remove)
        .merge(groups_read)
        .merge(groups_create)
        .merge(groups_update)
        .merge(groups_remove)
}

/// List roles with their permission grants
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    summary = "List roles",
    description = "Get a paginated list of roles with their permission grants",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Roles retrieved successfully", body = ApiResponse<PaginatedResponse<RoleResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<RoleResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::ROLES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read roles".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state.services.access.list_roles(page, per_page).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.roles,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a role by ID
#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    summary = "Get role",
    description = "Get a single role with its permission grants",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role retrieved successfully", body = ApiResponse<RoleResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<RoleResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::ROLES_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read roles".to_string(),
        ));
    }

    let role = state
        .services
        .access
        .get_role(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", id)))?;

    Ok(Json(ApiResponse::success(role)))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    summary = "Create role",
    description = "Create a role and grant it a set of permissions",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created successfully", body = ApiResponse<RoleResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Role name already taken", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoleResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::ROLES_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create roles".to_string(),
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

    let role = state.services.access.create_role(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(role))))
}

/// Update a role
#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}",
    summary = "Update role",
    description = "Update a role and replace its permission grants. The admin role cannot be renamed.",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated successfully", body = ApiResponse<RoleResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoleResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::ROLES_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update roles".to_string(),
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

    let role = state.services.access.update_role(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(role))))
}

/// Delete a role
#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    summary = "Delete role",
    description = "Delete a role. Users holding it simply lose it; the admin role cannot be deleted.",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Role not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::ROLES_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete roles".to_string(),
        ));
    }

    state.services.access.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List permissions
#[utoipa::path(
    get,
    path = "/api/v1/permissions",
    summary = "List permissions",
    description = "Get a paginated list of permissions, alphabetically",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Permissions retrieved successfully", body = ApiResponse<PaginatedResponse<PermissionResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_permissions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<PermissionResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSIONS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read permissions".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state
        .services
        .access
        .list_permissions(page, per_page)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.permissions,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a permission by ID
#[utoipa::path(
    get,
    path = "/api/v1/permissions/{id}",
    summary = "Get permission",
    description = "Get a single permission",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission retrieved successfully", body = ApiResponse<PermissionResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PermissionResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSIONS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read permissions".to_string(),
        ));
    }

    let permission = state
        .services
        .access
        .get_permission(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Permission {} not found", id)))?;

    Ok(Json(ApiResponse::success(permission)))
}

/// Create a permission
#[utoipa::path(
    post,
    path = "/api/v1/permissions",
    summary = "Create permission",
    description = "Create a permission. Names follow the resource:action form, with * as a wildcard half.",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created successfully", body = ApiResponse<PermissionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Permission name already taken", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_permission(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PERMISSIONS_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create permissions".to_string(),
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

    let permission = state.services.access.create_permission(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(permission))))
}

/// Update a permission
#[utoipa::path(
    put,
    path = "/api/v1/permissions/{id}",
    summary = "Update permission",
    description = "Update a permission's name, description or group",
    params(("id" = Uuid, Path, description = "Permission ID")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Permission updated successfully", body = ApiResponse<PermissionResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PERMISSIONS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update permissions".to_string(),
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

    let permission = state
        .services
        .access
        .update_permission(id, request)
        .await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(permission))))
}

/// Delete a permission
#[utoipa::path(
    delete,
    path = "/api/v1/permissions/{id}",
    summary = "Delete permission",
    description = "Delete a permission. Roles granting it simply lose the grant.",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 204, description = "Permission deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_permission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSIONS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete permissions".to_string(),
        ));
    }

    state.services.access.delete_permission(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List permission groups
#[utoipa::path(
    get,
    path = "/api/v1/permission-groups",
    summary = "List permission groups",
    description = "Get a paginated list of permission groups, ordered by sort order",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("pageSize" = Option<u64>, Query, description = "Items per page (default: 20)"),
    ),
    responses(
        (status = 200, description = "Permission groups retrieved successfully", body = ApiResponse<PaginatedResponse<PermissionGroupResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn list_permission_groups(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PaginatedResponse<PermissionGroupResponse>>>, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSION_GROUPS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read permission groups".to_string(),
        ));
    }

    let page = query.page.max(1);
    let per_page = query.clamped_page_size(state.config.api_max_page_size);
    let result = state.services.access.list_groups(page, per_page).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        result.groups,
        result.total,
        page,
        per_page,
    ))))
}

/// Get a permission group by ID
#[utoipa::path(
    get,
    path = "/api/v1/permission-groups/{id}",
    summary = "Get permission group",
    description = "Get a single permission group",
    params(("id" = Uuid, Path, description = "Permission group ID")),
    responses(
        (status = 200, description = "Permission group retrieved successfully", body = ApiResponse<PermissionGroupResponse>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission group not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn get_permission_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<Json<ApiResponse<PermissionGroupResponse>>, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSION_GROUPS_READ) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to read permission groups".to_string(),
        ));
    }

    let group = state
        .services
        .access
        .get_group(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Permission group {} not found", id)))?;

    Ok(Json(ApiResponse::success(group)))
}

/// Create a permission group
#[utoipa::path(
    post,
    path = "/api/v1/permission-groups",
    summary = "Create permission group",
    description = "Create a permission group for organizing the permission catalog",
    request_body = CreatePermissionGroupRequest,
    responses(
        (status = 201, description = "Permission group created successfully", body = ApiResponse<PermissionGroupResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 409, description = "Group name already taken", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn create_permission_group(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(request): Json<CreatePermissionGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionGroupResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PERMISSION_GROUPS_CREATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to create permission groups".to_string(),
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

    let group = state.services.access.create_group(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(group))))
}

/// Update a permission group
#[utoipa::path(
    put,
    path = "/api/v1/permission-groups/{id}",
    summary = "Update permission group",
    description = "Update a permission group's name or sort order",
    params(("id" = Uuid, Path, description = "Permission group ID")),
    request_body = UpdatePermissionGroupRequest,
    responses(
        (status = 200, description = "Permission group updated successfully", body = ApiResponse<PermissionGroupResponse>),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission group not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn update_permission_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
    Json(request): Json<UpdatePermissionGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionGroupResponse>>), ServiceError> {
    if !auth_user.has_permission(perm::PERMISSION_GROUPS_UPDATE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to update permission groups".to_string(),
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

    let group = state.services.access.update_group(id, request).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(group))))
}

/// Delete a permission group
#[utoipa::path(
    delete,
    path = "/api/v1/permission-groups/{id}",
    summary = "Delete permission group",
    description = "Delete a permission group. Its permissions survive ungrouped.",
    params(("id" = Uuid, Path, description = "Permission group ID")),
    responses(
        (status = 204, description = "Permission group deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Permission group not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = []))
)]
pub async fn delete_permission_group(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    auth_user: AuthUser,
) -> Result<StatusCode, ServiceError> {
    if !auth_user.has_permission(perm::PERMISSION_GROUPS_DELETE) {
        return Err(ServiceError::Forbidden(
            "Insufficient permissions to delete permission groups".to_string(),
        ));
    }

    state.services.access.delete_group(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
