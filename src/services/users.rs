use crate::{
    auth,
    db::DbPool,
    entities::{
        refresh_token, role,
        user::{self, ActiveModel as UserActiveModel, Entity as UserEntity, Model as UserModel},
        user_role,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, LoaderTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 64, message = "Username must be 3-64 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 120, message = "Display name must be 1-120 characters"))]
    pub display_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Full-replace update. The username is fixed at creation; a password is
/// re-hashed only when one is supplied.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 120, message = "Display name must be 1-120 characters"))]
    pub display_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    #[serde(default)]
    pub role_ids: Vec<Uuid>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_active: bool,
    pub roles: Vec<RoleSummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing user accounts and their role assignments
#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a user account with its role assignments
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create_user(
        &self,
        request: CreateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let taken = UserEntity::find()
            .filter(user::Column::Username.eq(request.username.as_str()))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();
        if taken {
            return Err(ServiceError::Conflict(format!(
                "Username '{}' is already taken",
                request.username
            )));
        }

        let role_ids = dedupe(request.role_ids);
        self.check_roles_exist(&role_ids).await?;

        let password_hash = auth::hash_password(&request.password)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;

        let user_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for user creation");
            ServiceError::DatabaseError(e)
        })?;

        let active_model = UserActiveModel {
            id: Set(user_id),
            username: Set(request.username.clone()),
            display_name: Set(request.display_name),
            password_hash: Set(password_hash),
            is_active: Set(request.is_active),
            ..Default::default()
        };

        let model = active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to create user");
            ServiceError::DatabaseError(e)
        })?;

        for role_id in &role_ids {
            let assignment = user_role::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(*role_id),
            };
            assignment.insert(&txn).await.map_err(|e| {
                error!(error = %e, user_id = %user_id, role_id = %role_id, "Failed to assign role");
                ServiceError::DatabaseError(e)
            })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to commit user creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(user_id = %user_id, username = %model.username, "User created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::UserCreated(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send user created event");
            }
        }

        let roles = self.get_roles(&model).await?;
        Ok(self.model_to_response(model, roles))
    }

    /// Retrieves a user with their roles
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get_user(&self, user_id: Uuid) -> Result<Option<UserResponse>, ServiceError> {
        let db = &*self.db_pool;

        let user = UserEntity::find_by_id(user_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to fetch user");
                ServiceError::DatabaseError(e)
            })?;

        match user {
            Some(model) => {
                let roles = self.get_roles(&model).await?;
                Ok(Some(self.model_to_response(model, roles)))
            }
            None => Ok(None),
        }
    }

    /// Lists users with pagination
    #[instrument(skip(self))]
    pub async fn list_users(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<UserListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = UserEntity::find().order_by_asc(user::Column::Username);
        if let Some(term) = search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(user::Column::Username.contains(term))
                    .add(user::Column::DisplayName.contains(term)),
            );
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count users");
            ServiceError::DatabaseError(e)
        })?;

        let users = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch users page");
            ServiceError::DatabaseError(e)
        })?;

        let roles_per_user = users
            .load_many_to_many(role::Entity, user_role::Entity, db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to load role assignments");
                ServiceError::DatabaseError(e)
            })?;

        let users = users
            .into_iter()
            .zip(roles_per_user)
            .map(|(model, roles)| self.model_to_response(model, roles))
            .collect();

        Ok(UserListResponse {
            users,
            total,
            page,
            per_page,
        })
    }

    /// Updates a user account, replacing its role assignments
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn update_user(
        &self,
        user_id: Uuid,
        request: UpdateUserRequest,
    ) -> Result<UserResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let role_ids = dedupe(request.role_ids);
        self.check_roles_exist(&role_ids).await?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to start transaction for user update");
            ServiceError::DatabaseError(e)
        })?;

        let user = UserEntity::find_by_id(user_id)
            .one(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to find user for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(user_id = %user_id, "User not found for update");
                ServiceError::NotFound(format!("User {} not found", user_id))
            })?;

        let deactivated = user.is_active && !request.is_active;

        let mut active_model: UserActiveModel = user.into();
        active_model.display_name = Set(request.display_name);
        active_model.is_active = Set(request.is_active);
        if let Some(password) = request.password.as_deref() {
            let password_hash = auth::hash_password(password)
                .map_err(|e| ServiceError::HashError(e.to_string()))?;
            active_model.password_hash = Set(password_hash);
        }

        let updated = active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to update user");
            ServiceError::DatabaseError(e)
        })?;

        // Replace the role assignment set
        user_role::Entity::delete_many()
            .filter(user_role::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to clear role assignments");
                ServiceError::DatabaseError(e)
            })?;
        for role_id in &role_ids {
            let assignment = user_role::ActiveModel {
                user_id: Set(user_id),
                role_id: Set(*role_id),
            };
            assignment.insert(&txn).await.map_err(|e| {
                error!(error = %e, user_id = %user_id, role_id = %role_id, "Failed to assign role");
                ServiceError::DatabaseError(e)
            })?;
        }

        // A deactivated account must not keep refreshing sessions
        if deactivated {
            refresh_token::Entity::update_many()
                .col_expr(
                    refresh_token::Column::Revoked,
                    sea_orm::sea_query::Expr::value(true),
                )
                .filter(refresh_token::Column::UserId.eq(user_id))
                .filter(refresh_token::Column::Revoked.eq(false))
                .exec(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, user_id = %user_id, "Failed to revoke refresh tokens");
                    ServiceError::DatabaseError(e)
                })?;
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, user_id = %user_id, "Failed to commit user update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(user_id = %user_id, deactivated = deactivated, "User updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::UserUpdated(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send user updated event");
            }
        }

        let roles = self.get_roles(&updated).await?;
        Ok(self.model_to_response(updated, roles))
    }

    /// Deletes a user account. Role assignments and refresh tokens go with it.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = UserEntity::delete_by_id(user_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Failed to delete user");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "User {} not found",
                user_id
            )));
        }

        info!(user_id = %user_id, "User deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::UserDeleted(user_id)).await {
                warn!(error = %e, user_id = %user_id, "Failed to send user deleted event");
            }
        }

        Ok(())
    }

    /// First-run helper: creates `username` with the admin role when no
    /// account exists yet. Returns false when the user table is already
    /// populated.
    #[instrument(skip(self, password))]
    pub async fn bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, ServiceError> {
        let existing = UserEntity::find()
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if existing > 0 {
            return Ok(false);
        }

        let admin_role = role::Entity::find()
            .filter(role::Column::Name.eq(auth::ADMIN_ROLE))
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(
                    "admin role missing; permission catalog was not seeded".to_string(),
                )
            })?;

        self.create_user(CreateUserRequest {
            username: username.to_string(),
            display_name: "Administrator".to_string(),
            password: password.to_string(),
            role_ids: vec![admin_role.id],
            is_active: true,
        })
        .await?;

        info!(username = %username, "Bootstrap admin account created");
        Ok(true)
    }

    async fn get_roles(&self, user: &UserModel) -> Result<Vec<role::Model>, ServiceError> {
        user.find_related(role::Entity)
            .all(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user.id, "Failed to load user roles");
                ServiceError::DatabaseError(e)
            })
    }

    async fn check_roles_exist(&self, role_ids: &[Uuid]) -> Result<(), ServiceError> {
        if role_ids.is_empty() {
            return Ok(());
        }

        let found = role::Entity::find()
            .filter(role::Column::Id.is_in(role_ids.iter().copied()))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if found != role_ids.len() as u64 {
            return Err(ServiceError::ValidationError(
                "role_ids references an unknown role".to_string(),
            ));
        }
        Ok(())
    }

    fn model_to_response(&self, model: UserModel, roles: Vec<role::Model>) -> UserResponse {
        UserResponse {
            id: model.id,
            username: model.username,
            display_name: model.display_name,
            is_active: model.is_active,
            roles: roles
                .into_iter()
                .map(|r| RoleSummary {
                    id: r.id,
                    name: r.name,
                })
                .collect(),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn dedupe(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    #[test]
    fn model_to_response_never_exposes_the_password_hash() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let model = UserModel {
            id,
            username: "clerk1".to_string(),
            display_name: "Front Desk".to_string(),
            password_hash: "$argon2id$...".to_string(),
            is_active: true,
            created_at: now,
            updated_at: None,
        };
        let roles = vec![role::Model {
            id: Uuid::new_v4(),
            name: "clerk".to_string(),
            description: None,
            created_at: now,
            updated_at: None,
        }];

        let service = UserService::new(Arc::new(DatabaseConnection::Disconnected), None);
        let response = service.model_to_response(model, roles);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "clerk1");
        assert_eq!(json["roles"][0]["name"], "clerk");
    }

    #[test]
    fn create_request_requires_a_real_password() {
        let request = CreateUserRequest {
            username: "clerk1".to_string(),
            display_name: "Front Desk".to_string(),
            password: "short".to_string(),
            role_ids: vec![],
            is_active: true,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn duplicate_role_ids_collapse() {
        let id = Uuid::new_v4();
        assert_eq!(dedupe(vec![id, id]).len(), 1);
    }
}
