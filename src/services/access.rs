use crate::{
    auth,
    db::DbPool,
    entities::{
        permission::{self, Entity as PermissionEntity},
        permission_group::{self, Entity as PermissionGroupEntity},
        role::{self, ActiveModel as RoleActiveModel, Entity as RoleEntity, Model as RoleModel},
        role_permission,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, LoaderTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub use crate::auth::ADMIN_ROLE;

fn validate_permission_name(name: &str) -> Result<(), ValidationError> {
    let Some((resource, action)) = name.split_once(':') else {
        return Err(ValidationError::new("permission_format"));
    };
    let well_formed = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '*')
    };
    if !well_formed(resource) || !well_formed(action) {
        return Err(ValidationError::new("permission_format"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role name must be 1-64 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role name must be 1-64 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionRequest {
    /// `resource:action` form, e.g. `products:read`.
    #[validate(custom = "validate_permission_name")]
    pub name: String,
    pub description: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionRequest {
    #[validate(custom = "validate_permission_name")]
    pub name: String,
    pub description: Option<String>,
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionGroupRequest {
    #[validate(length(min = 1, max = 64, message = "Group name must be 1-64 characters"))]
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionGroupRequest {
    #[validate(length(min = 1, max = 64, message = "Group name must be 1-64 characters"))]
    pub name: String,
    pub sort_order: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub group_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<PermissionResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionGroupResponse {
    pub id: Uuid,
    pub name: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleListResponse {
    pub roles: Vec<RoleResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionListResponse {
    pub permissions: Vec<PermissionResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionGroupListResponse {
    pub groups: Vec<PermissionGroupResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for roles, permissions and permission groups
#[derive(Clone)]
pub struct AccessService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl AccessService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    // ---- roles ----

    /// Creates a role with its permission grants
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_role(&self, request: CreateRoleRequest) -> Result<RoleResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let taken = RoleEntity::find()
            .filter(role::Column::Name.eq(request.name.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Role '{}' already exists",
                request.name
            )));
        }

        let permission_ids = dedupe(request.permission_ids);
        self.check_permissions_exist(&permission_ids).await?;

        let role_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for role creation");
            ServiceError::DatabaseError(e)
        })?;

        let active_model = RoleActiveModel {
            id: Set(role_id),
            name: Set(request.name),
            description: Set(request.description),
            ..Default::default()
        };
        let model = active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to create role");
            ServiceError::DatabaseError(e)
        })?;

        for permission_id in &permission_ids {
            let grant = role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
            };
            grant.insert(&txn).await.map_err(|e| {
                error!(error = %e, role_id = %role_id, permission_id = %permission_id, "Failed to grant permission");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to commit role creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(role_id = %role_id, name = %model.name, grants = permission_ids.len(), "Role created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::RoleCreated(role_id)).await {
                warn!(error = %e, role_id = %role_id, "Failed to send role created event");
            }
        }

        let permissions = self.get_role_permissions(&model).await?;
        Ok(self.role_to_response(model, permissions))
    }

    /// Retrieves a role with its permission grants
    #[instrument(skip(self), fields(role_id = %role_id))]
    pub async fn get_role(&self, role_id: Uuid) -> Result<Option<RoleResponse>, ServiceError> {
        let db = &*self.db_pool;

        let role = RoleEntity::find_by_id(role_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, role_id = %role_id, "Failed to fetch role");
                ServiceError::DatabaseError(e)
            })?;

        match role {
            Some(model) => {
                let permissions = self.get_role_permissions(&model).await?;
                Ok(Some(self.role_to_response(model, permissions)))
            }
            None => Ok(None),
        }
    }

    /// Lists roles with pagination
    #[instrument(skip(self))]
    pub async fn list_roles(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<RoleListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = RoleEntity::find()
            .order_by_asc(role::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count roles");
            ServiceError::DatabaseError(e)
        })?;

        let roles = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch roles page");
            ServiceError::DatabaseError(e)
        })?;

        let grants = roles
            .load_many_to_many(PermissionEntity, role_permission::Entity, db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load permission grants");
                ServiceError::DatabaseError(e)
            })?;

        let roles = roles
            .into_iter()
            .zip(grants)
            .map(|(model, permissions)| self.role_to_response(model, permissions))
            .collect();

        Ok(RoleListResponse {
            roles,
            total,
            page,
            per_page,
        })
    }

    /// Updates a role, replacing its permission grants
    #[instrument(skip(self, request), fields(role_id = %role_id))]
    pub async fn update_role(
        &self,
        role_id: Uuid,
        request: UpdateRoleRequest,
    ) -> Result<RoleResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let permission_ids = dedupe(request.permission_ids);
        self.check_permissions_exist(&permission_ids).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to start transaction for role update");
            ServiceError::DatabaseError(e)
        })?;

        let role = RoleEntity::find_by_id(role_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, role_id = %role_id, "Failed to find role for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(role_id = %role_id, "Role not found for update");
                ServiceError::NotFound(format!("Role {} not found", role_id))
            })?;

        if role.name == ADMIN_ROLE && request.name != ADMIN_ROLE {
            return Err(ServiceError::InvalidOperation(
                "The admin role cannot be renamed".to_string(),
            ));
        }

        let mut active_model: RoleActiveModel = role.into();
        active_model.name = Set(request.name);
        active_model.description = Set(request.description);

        let updated = active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to update role");
            ServiceError::DatabaseError(e)
        })?;

        role_permission::Entity::delete_many()
            .filter(role_permission::Column::RoleId.eq(role_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, role_id = %role_id, "Failed to clear permission grants");
                ServiceError::DatabaseError(e)
            })?;
        for permission_id in &permission_ids {
            let grant = role_permission::ActiveModel {
                role_id: Set(role_id),
                permission_id: Set(*permission_id),
            };
            grant.insert(&txn).await.map_err(|e| {
                error!(error = %e, role_id = %role_id, permission_id = %permission_id, "Failed to grant permission");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to commit role update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(role_id = %role_id, grants = permission_ids.len(), "Role updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::RoleUpdated(role_id)).await {
                warn!(error = %e, role_id = %role_id, "Failed to send role updated event");
            }
        }

        let permissions = self.get_role_permissions(&updated).await?;
        Ok(self.role_to_response(updated, permissions))
    }

    /// Deletes a role. Users who held it simply lose the grants.
    #[instrument(skip(self), fields(role_id = %role_id))]
    pub async fn delete_role(&self, role_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let role = RoleEntity::find_by_id(role_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Role {} not found", role_id)))?;

        if role.name == ADMIN_ROLE {
            return Err(ServiceError::InvalidOperation(
                "The admin role cannot be deleted".to_string(),
            ));
        }

        role.delete(db).await.map_err(|e| {
            error!(error = %e, role_id = %role_id, "Failed to delete role");
            ServiceError::DatabaseError(e)
        })?;

        info!(role_id = %role_id, "Role deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::RoleDeleted(role_id)).await {
                warn!(error = %e, role_id = %role_id, "Failed to send role deleted event");
            }
        }

        Ok(())
    }

    // ---- permissions ----

    /// Creates a permission
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_permission(
        &self,
        request: CreatePermissionRequest,
    ) -> Result<PermissionResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let taken = PermissionEntity::find()
            .filter(permission::Column::Name.eq(request.name.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Permission '{}' already exists",
                request.name
            )));
        }
        self.check_group_exists(request.group_id).await?;

        let permission_id = Uuid::new_v4();
        let active_model = permission::ActiveModel {
            id: Set(permission_id),
            name: Set(request.name),
            description: Set(request.description),
            group_id: Set(request.group_id),
            ..Default::default()
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, permission_id = %permission_id, "Failed to create permission");
            ServiceError::DatabaseError(e)
        })?;

        info!(permission_id = %permission_id, name = %model.name, "Permission created");
        Ok(permission_to_response(model))
    }

    /// Retrieves a permission by ID
    #[instrument(skip(self), fields(permission_id = %permission_id))]
    pub async fn get_permission(
        &self,
        permission_id: Uuid,
    ) -> Result<Option<PermissionResponse>, ServiceError> {
        let permission = PermissionEntity::find_by_id(permission_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, permission_id = %permission_id, "Failed to fetch permission");
                ServiceError::DatabaseError(e)
            })?;

        Ok(permission.map(permission_to_response))
    }

    /// Lists permissions, alphabetically
    #[instrument(skip(self))]
    pub async fn list_permissions(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<PermissionListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = PermissionEntity::find()
            .order_by_asc(permission::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count permissions");
            ServiceError::DatabaseError(e)
        })?;

        let permissions = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch permissions page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(PermissionListResponse {
            permissions: permissions.into_iter().map(permission_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates a permission
    #[instrument(skip(self, request), fields(permission_id = %permission_id))]
    pub async fn update_permission(
        &self,
        permission_id: Uuid,
        request: UpdatePermissionRequest,
    ) -> Result<PermissionResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        self.check_group_exists(request.group_id).await?;

        let permission = PermissionEntity::find_by_id(permission_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, permission_id = %permission_id, "Failed to find permission for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Permission {} not found", permission_id))
            })?;

        let mut active_model: permission::ActiveModel = permission.into();
        active_model.name = Set(request.name);
        active_model.description = Set(request.description);
        active_model.group_id = Set(request.group_id);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, permission_id = %permission_id, "Failed to update permission");
            ServiceError::DatabaseError(e)
        })?;

        info!(permission_id = %permission_id, "Permission updated");
        Ok(permission_to_response(updated))
    }

    /// Deletes a permission, revoking it from every role that held it
    #[instrument(skip(self), fields(permission_id = %permission_id))]
    pub async fn delete_permission(&self, permission_id: Uuid) -> Result<(), ServiceError> {
        let result = PermissionEntity::delete_by_id(permission_id)
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, permission_id = %permission_id, "Failed to delete permission");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Permission {} not found",
                permission_id
            )));
        }

        info!(permission_id = %permission_id, "Permission deleted");
        Ok(())
    }

    // ---- permission groups ----

    /// Creates a permission group
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_group(
        &self,
        request: CreatePermissionGroupRequest,
    ) -> Result<PermissionGroupResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let taken = PermissionGroupEntity::find()
            .filter(permission_group::Column::Name.eq(request.name.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Permission group '{}' already exists",
                request.name
            )));
        }

        let group_id = Uuid::new_v4();
        let active_model = permission_group::ActiveModel {
            id: Set(group_id),
            name: Set(request.name),
            sort_order: Set(request.sort_order),
            ..Default::default()
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, group_id = %group_id, "Failed to create permission group");
            ServiceError::DatabaseError(e)
        })?;

        info!(group_id = %group_id, name = %model.name, "Permission group created");
        Ok(group_to_response(model))
    }

    /// Retrieves a permission group by ID
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub async fn get_group(
        &self,
        group_id: Uuid,
    ) -> Result<Option<PermissionGroupResponse>, ServiceError> {
        let group = PermissionGroupEntity::find_by_id(group_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, group_id = %group_id, "Failed to fetch permission group");
                ServiceError::DatabaseError(e)
            })?;

        Ok(group.map(group_to_response))
    }

    /// Lists permission groups in display order
    #[instrument(skip(self))]
    pub async fn list_groups(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<PermissionGroupListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = PermissionGroupEntity::find()
            .order_by_asc(permission_group::Column::SortOrder)
            .order_by_asc(permission_group::Column::Name)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count permission groups");
            ServiceError::DatabaseError(e)
        })?;

        let groups = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch permission groups page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(PermissionGroupListResponse {
            groups: groups.into_iter().map(group_to_response).collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates a permission group
    #[instrument(skip(self, request), fields(group_id = %group_id))]
    pub async fn update_group(
        &self,
        group_id: Uuid,
        request: UpdatePermissionGroupRequest,
    ) -> Result<PermissionGroupResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let group = PermissionGroupEntity::find_by_id(group_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, group_id = %group_id, "Failed to find permission group for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Permission group {} not found", group_id))
            })?;

        let mut active_model: permission_group::ActiveModel = group.into();
        active_model.name = Set(request.name);
        active_model.sort_order = Set(request.sort_order);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, group_id = %group_id, "Failed to update permission group");
            ServiceError::DatabaseError(e)
        })?;

        info!(group_id = %group_id, "Permission group updated");
        Ok(group_to_response(updated))
    }

    /// Deletes a permission group. Its permissions survive ungrouped.
    #[instrument(skip(self), fields(group_id = %group_id))]
    pub async fn delete_group(&self, group_id: Uuid) -> Result<(), ServiceError> {
        let result = PermissionGroupEntity::delete_by_id(group_id)
            .exec(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, group_id = %group_id, "Failed to delete permission group");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Permission group {} not found",
                group_id
            )));
        }

        info!(group_id = %group_id, "Permission group deleted");
        Ok(())
    }

    // ---- seeding ----

    /// Syncs the static permission catalog into the database and makes sure
    /// the admin role exists. Existing rows are left alone, so operator edits
    /// survive restarts.
    #[instrument(skip(self))]
    pub async fn seed_catalog(&self) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for catalog seeding");
            ServiceError::DatabaseError(e)
        })?;

        let mut group_ids: HashMap<String, Uuid> = PermissionGroupEntity::find()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|g| (g.name, g.id))
            .collect();

        let mut seeded_groups = 0usize;
        for (position, group_name) in auth::group_names().into_iter().enumerate() {
            if group_ids.contains_key(group_name) {
                continue;
            }
            let group_id = Uuid::new_v4();
            let active_model = permission_group::ActiveModel {
                id: Set(group_id),
                name: Set(group_name.to_string()),
                sort_order: Set(position as i32),
                ..Default::default()
            };
            active_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            group_ids.insert(group_name.to_string(), group_id);
            seeded_groups += 1;
        }

        let existing: Vec<String> = PermissionEntity::find()
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .into_iter()
            .map(|p| p.name)
            .collect();

        let mut seeded_permissions = 0usize;
        for entry in auth::PERMISSIONS.iter() {
            if existing.iter().any(|name| name == &entry.name) {
                continue;
            }
            let active_model = permission::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(entry.name.clone()),
                description: Set(Some(entry.description.clone())),
                group_id: Set(group_ids.get(&entry.group).copied()),
                ..Default::default()
            };
            active_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
            seeded_permissions += 1;
        }

        let admin_exists = RoleEntity::find()
            .filter(role::Column::Name.eq(ADMIN_ROLE))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if !admin_exists {
            let active_model = RoleActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(ADMIN_ROLE.to_string()),
                description: Set(Some("Full access to every resource".to_string())),
                ..Default::default()
            };
            active_model
                .insert(&txn)
                .await
                .map_err(ServiceError::DatabaseError)?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, "Failed to commit catalog seeding transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            seeded_groups = seeded_groups,
            seeded_permissions = seeded_permissions,
            admin_created = !admin_exists,
            "Permission catalog synced"
        );
        Ok(())
    }

    async fn get_role_permissions(
        &self,
        role: &RoleModel,
    ) -> Result<Vec<permission::Model>, ServiceError> {
        role.find_related(PermissionEntity)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, role_id = %role.id, "Failed to load role permissions");
                ServiceError::DatabaseError(e)
            })
    }

    async fn check_permissions_exist(&self, permission_ids: &[Uuid]) -> Result<(), ServiceError> {
        if permission_ids.is_empty() {
            return Ok(());
        }

        let found = PermissionEntity::find()
            .filter(permission::Column::Id.is_in(permission_ids.iter().copied()))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if found != permission_ids.len() as u64 {
            return Err(ServiceError::ValidationError(
                "permission_ids references an unknown permission".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_group_exists(&self, group_id: Option<Uuid>) -> Result<(), ServiceError> {
        let Some(group_id) = group_id else {
            return Ok(());
        };

        let exists = PermissionGroupEntity::find_by_id(group_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();

        if !exists {
            return Err(ServiceError::ValidationError(format!(
                "group_id references an unknown permission group ({})",
                group_id
            )));
        }
        Ok(())
    }

    fn role_to_response(&self, model: RoleModel, permissions: Vec<permission::Model>) -> RoleResponse {
        RoleResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            permissions: permissions.into_iter().map(permission_to_response).collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn permission_to_response(model: permission::Model) -> PermissionResponse {
    PermissionResponse {
        id: model.id,
        name: model.name,
        description: model.description,
        group_id: model.group_id,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn group_to_response(model: permission_group::Model) -> PermissionGroupResponse {
    PermissionGroupResponse {
        id: model.id,
        name: model.name,
        sort_order: model.sort_order,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn dedupe(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}
