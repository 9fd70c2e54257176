use crate::{
    db::DbPool,
    entities::{
        category,
        product::{self, ActiveModel as ProductActiveModel, Entity as ProductEntity, Model as ProductModel},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    valuation::Carat,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
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
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 120, message = "Product name must be 1-120 characters"))]
    pub name: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_gold: bool,
    #[serde(default)]
    pub contains_gold: bool,
    pub carat: Option<i16>,
    pub weight_brut: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 120, message = "Product name must be 1-120 characters"))]
    pub name: String,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub is_gold: bool,
    #[serde(default)]
    pub contains_gold: bool,
    pub carat: Option<i16>,
    pub weight_brut: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub is_gold: bool,
    pub contains_gold: bool,
    pub carat: Option<i16>,
    pub weight_brut: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing the product catalog
#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new catalog product
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_product(
        &self,
        request: CreateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        check_carat(request.carat)?;
        check_weight(request.weight_brut)?;

        let db = &*self.db_pool;
        self.check_category_exists(request.category_id).await?;

        let product_id = Uuid::new_v4();
        let active_model = ProductActiveModel {
            id: Set(product_id),
            name: Set(request.name),
            category_id: Set(request.category_id),
            is_gold: Set(request.is_gold),
            contains_gold: Set(request.contains_gold),
            carat: Set(request.carat),
            weight_brut: Set(request.weight_brut),
            ..Default::default()
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, product_id = %product_id, "Failed to create product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %product_id, name = %model.name, is_gold = model.is_gold, "Product created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductCreated(product_id)).await {
                warn!(error = %e, product_id = %product_id, "Failed to send product created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Retrieves a product by ID
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn get_product(
        &self,
        product_id: Uuid,
    ) -> Result<Option<ProductResponse>, ServiceError> {
        let db = &*self.db_pool;

        let product = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to fetch product");
                ServiceError::DatabaseError(e)
            })?;

        Ok(product.map(|model| self.model_to_response(model)))
    }

    /// Lists products with pagination, optionally filtered by name search
    /// and category
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
        category_id: Option<Uuid>,
    ) -> Result<ProductListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = ProductEntity::find().order_by_asc(product::Column::Name);
        if let Some(term) = search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(product::Column::Name.contains(term));
        }
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count products");
            ServiceError::DatabaseError(e)
        })?;

        let products = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch products page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(ProductListResponse {
            products: products
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates a product. Catalog changes never touch historical document
    /// lines; those keep the snapshot taken when they were written.
    #[instrument(skip(self, request), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        request: UpdateProductRequest,
    ) -> Result<ProductResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;
        check_carat(request.carat)?;
        check_weight(request.weight_brut)?;

        let db = &*self.db_pool;
        self.check_category_exists(request.category_id).await?;

        let product = ProductEntity::find_by_id(product_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to find product for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(product_id = %product_id, "Product not found for update");
                ServiceError::NotFound(format!("Product {} not found", product_id))
            })?;

        let mut active_model: ProductActiveModel = product.into();
        active_model.name = Set(request.name);
        active_model.category_id = Set(request.category_id);
        active_model.is_gold = Set(request.is_gold);
        active_model.contains_gold = Set(request.contains_gold);
        active_model.carat = Set(request.carat);
        active_model.weight_brut = Set(request.weight_brut);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, product_id = %product_id, "Failed to update product");
            ServiceError::DatabaseError(e)
        })?;

        info!(product_id = %product_id, "Product updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductUpdated(product_id)).await {
                warn!(error = %e, product_id = %product_id, "Failed to send product updated event");
            }
        }

        Ok(self.model_to_response(updated))
    }

    /// Deletes a product from the catalog. Document lines that referenced it
    /// keep their snapshot columns, so historical valuations are unaffected.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = ProductEntity::delete_by_id(product_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, product_id = %product_id, "Failed to delete product");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        info!(product_id = %product_id, "Product deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ProductDeleted(product_id)).await {
                warn!(error = %e, product_id = %product_id, "Failed to send product deleted event");
            }
        }

        Ok(())
    }

    async fn check_category_exists(&self, category_id: Option<Uuid>) -> Result<(), ServiceError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };

        let exists = category::Entity::find_by_id(category_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();

        if !exists {
            return Err(ServiceError::ValidationError(format!(
                "category_id references an unknown category ({})",
                category_id
            )));
        }
        Ok(())
    }

    fn model_to_response(&self, model: ProductModel) -> ProductResponse {
        ProductResponse {
            id: model.id,
            name: model.name,
            category_id: model.category_id,
            is_gold: model.is_gold,
            contains_gold: model.contains_gold,
            carat: model.carat,
            weight_brut: model.weight_brut,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn check_carat(carat: Option<i16>) -> Result<(), ServiceError> {
    if let Some(raw) = carat {
        if Carat::from(raw) == Carat::Unrated {
            return Err(ServiceError::ValidationError(format!(
                "Unrecognized carat tier: {}",
                raw
            )));
        }
    }
    Ok(())
}

fn check_weight(weight_brut: Option<Decimal>) -> Result<(), ServiceError> {
    if let Some(weight) = weight_brut {
        if weight < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "weight_brut must not be negative".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::DatabaseConnection;

    #[test]
    fn model_to_response_keeps_all_fields() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let category_id = Uuid::new_v4();
        let model = ProductModel {
            id,
            name: "Chain 22k".to_string(),
            category_id: Some(category_id),
            is_gold: true,
            contains_gold: false,
            carat: Some(22),
            weight_brut: Some(dec!(12.5)),
            created_at: now,
            updated_at: None,
        };

        let service = ProductService::new(Arc::new(DatabaseConnection::Disconnected), None);
        let response = service.model_to_response(model);

        assert_eq!(response.id, id);
        assert_eq!(response.category_id, Some(category_id));
        assert!(response.is_gold);
        assert_eq!(response.carat, Some(22));
        assert_eq!(response.weight_brut, Some(dec!(12.5)));
    }

    #[test]
    fn carat_outside_the_tier_table_is_rejected() {
        assert!(check_carat(Some(22)).is_ok());
        assert!(check_carat(Some(8)).is_ok());
        assert!(check_carat(None).is_ok());
        assert!(check_carat(Some(23)).is_err());
        assert!(check_carat(Some(0)).is_err());
    }

    #[test]
    fn negative_weight_is_rejected() {
        assert!(check_weight(Some(dec!(0))).is_ok());
        assert!(check_weight(Some(dec!(-0.1))).is_err());
    }
}
