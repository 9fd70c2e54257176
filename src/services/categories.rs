use crate::{
    db::DbPool,
    entities::category::{self, ActiveModel as CategoryActiveModel, Entity as CategoryEntity, Model as CategoryModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "Category name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 120, message = "Category name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing product categories
#[derive(Clone)]
pub struct CategoryService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl CategoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new category
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let category_id = Uuid::new_v4();

        let active_model = CategoryActiveModel {
            id: Set(category_id),
            name: Set(request.name.clone()),
            description: Set(request.description),
            ..Default::default()
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, category_id = %category_id, "Failed to create category");
            ServiceError::DatabaseError(e)
        })?;

        info!(category_id = %category_id, name = %model.name, "Category created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CategoryCreated(category_id)).await {
                warn!(error = %e, category_id = %category_id, "Failed to send category created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Retrieves a category by ID
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn get_category(
        &self,
        category_id: Uuid,
    ) -> Result<Option<CategoryResponse>, ServiceError> {
        let db = &*self.db_pool;

        let category = CategoryEntity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to fetch category");
                ServiceError::DatabaseError(e)
            })?;

        Ok(category.map(|model| self.model_to_response(model)))
    }

    /// Lists categories with pagination, alphabetically
    #[instrument(skip(self))]
    pub async fn list_categories(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<CategoryListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = CategoryEntity::find().order_by_asc(category::Column::Name);
        if let Some(term) = search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(category::Column::Name.contains(term));
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count categories");
            ServiceError::DatabaseError(e)
        })?;

        let categories = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch categories page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(CategoryListResponse {
            categories: categories
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates a category
    #[instrument(skip(self, request), fields(category_id = %category_id))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let category = CategoryEntity::find_by_id(category_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to find category for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(category_id = %category_id, "Category not found for update");
                ServiceError::NotFound(format!("Category {} not found", category_id))
            })?;

        let mut active_model: CategoryActiveModel = category.into();
        active_model.name = Set(request.name);
        active_model.description = Set(request.description);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, category_id = %category_id, "Failed to update category");
            ServiceError::DatabaseError(e)
        })?;

        info!(category_id = %category_id, "Category updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CategoryUpdated(category_id)).await {
                warn!(error = %e, category_id = %category_id, "Failed to send category updated event");
            }
        }

        Ok(self.model_to_response(updated))
    }

    /// Deletes a category. Products that referenced it keep existing with
    /// their category cleared by the foreign key.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = CategoryEntity::delete_by_id(category_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, category_id = %category_id, "Failed to delete category");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Category {} not found",
                category_id
            )));
        }

        info!(category_id = %category_id, "Category deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::CategoryDeleted(category_id)).await {
                warn!(error = %e, category_id = %category_id, "Failed to send category deleted event");
            }
        }

        Ok(())
    }

    fn model_to_response(&self, model: CategoryModel) -> CategoryResponse {
        CategoryResponse {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::DatabaseConnection;

    #[test]
    fn model_to_response_keeps_all_fields() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let model = CategoryModel {
            id,
            name: "Rings".to_string(),
            description: Some("Wedding and engagement".to_string()),
            created_at: now,
            updated_at: None,
        };

        let service = CategoryService::new(Arc::new(DatabaseConnection::Disconnected), None);
        let response = service.model_to_response(model);

        assert_eq!(response.id, id);
        assert_eq!(response.name, "Rings");
        assert_eq!(response.description.as_deref(), Some("Wedding and engagement"));
        assert_eq!(response.created_at, now);
    }

    #[test]
    fn create_request_rejects_empty_name() {
        let request = CreateCategoryRequest {
            name: String::new(),
            description: None,
        };
        assert!(request.validate().is_err());
    }
}
