use crate::{
    db::DbPool,
    entities::wholesaler::{self, ActiveModel as WholesalerActiveModel, Entity as WholesalerEntity, Model as WholesalerModel},
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
pub struct CreateWholesalerRequest {
    #[validate(length(min = 1, max = 120, message = "Wholesaler name must be 1-120 characters"))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateWholesalerRequest {
    #[validate(length(min = 1, max = 120, message = "Wholesaler name must be 1-120 characters"))]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WholesalerResponse {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WholesalerListResponse {
    pub wholesalers: Vec<WholesalerResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for managing wholesaler partners
#[derive(Clone)]
pub struct WholesalerService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl WholesalerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new wholesaler
    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_wholesaler(
        &self,
        request: CreateWholesalerRequest,
    ) -> Result<WholesalerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;
        let wholesaler_id = Uuid::new_v4();

        let active_model = WholesalerActiveModel {
            id: Set(wholesaler_id),
            name: Set(request.name),
            phone: Set(request.phone),
            address: Set(request.address),
            notes: Set(request.notes),
            ..Default::default()
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, wholesaler_id = %wholesaler_id, "Failed to create wholesaler");
            ServiceError::DatabaseError(e)
        })?;

        info!(wholesaler_id = %wholesaler_id, name = %model.name, "Wholesaler created");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::WholesalerCreated(wholesaler_id))
                .await
            {
                warn!(error = %e, wholesaler_id = %wholesaler_id, "Failed to send wholesaler created event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Retrieves a wholesaler by ID
    #[instrument(skip(self), fields(wholesaler_id = %wholesaler_id))]
    pub async fn get_wholesaler(
        &self,
        wholesaler_id: Uuid,
    ) -> Result<Option<WholesalerResponse>, ServiceError> {
        let db = &*self.db_pool;

        let wholesaler = WholesalerEntity::find_by_id(wholesaler_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, wholesaler_id = %wholesaler_id, "Failed to fetch wholesaler");
                ServiceError::DatabaseError(e)
            })?;

        Ok(wholesaler.map(|model| self.model_to_response(model)))
    }

    /// Lists wholesalers with pagination, alphabetically
    #[instrument(skip(self))]
    pub async fn list_wholesalers(
        &self,
        page: u64,
        per_page: u64,
        search: Option<String>,
    ) -> Result<WholesalerListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = WholesalerEntity::find().order_by_asc(wholesaler::Column::Name);
        if let Some(term) = search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(wholesaler::Column::Name.contains(term));
        }

        let paginator = query.paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count wholesalers");
            ServiceError::DatabaseError(e)
        })?;

        let wholesalers = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch wholesalers page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(WholesalerListResponse {
            wholesalers: wholesalers
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Updates a wholesaler
    #[instrument(skip(self, request), fields(wholesaler_id = %wholesaler_id))]
    pub async fn update_wholesaler(
        &self,
        wholesaler_id: Uuid,
        request: UpdateWholesalerRequest,
    ) -> Result<WholesalerResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let wholesaler = WholesalerEntity::find_by_id(wholesaler_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, wholesaler_id = %wholesaler_id, "Failed to find wholesaler for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(wholesaler_id = %wholesaler_id, "Wholesaler not found for update");
                ServiceError::NotFound(format!("Wholesaler {} not found", wholesaler_id))
            })?;

        let mut active_model: WholesalerActiveModel = wholesaler.into();
        active_model.name = Set(request.name);
        active_model.phone = Set(request.phone);
        active_model.address = Set(request.address);
        active_model.notes = Set(request.notes);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, wholesaler_id = %wholesaler_id, "Failed to update wholesaler");
            ServiceError::DatabaseError(e)
        })?;

        info!(wholesaler_id = %wholesaler_id, "Wholesaler updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::WholesalerUpdated(wholesaler_id))
                .await
            {
                warn!(error = %e, wholesaler_id = %wholesaler_id, "Failed to send wholesaler updated event");
            }
        }

        Ok(self.model_to_response(updated))
    }

    /// Deletes a wholesaler. Documents that referenced it survive with the
    /// reference cleared by the foreign key.
    #[instrument(skip(self), fields(wholesaler_id = %wholesaler_id))]
    pub async fn delete_wholesaler(&self, wholesaler_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = WholesalerEntity::delete_by_id(wholesaler_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, wholesaler_id = %wholesaler_id, "Failed to delete wholesaler");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Wholesaler {} not found",
                wholesaler_id
            )));
        }

        info!(wholesaler_id = %wholesaler_id, "Wholesaler deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::WholesalerDeleted(wholesaler_id))
                .await
            {
                warn!(error = %e, wholesaler_id = %wholesaler_id, "Failed to send wholesaler deleted event");
            }
        }

        Ok(())
    }

    fn model_to_response(&self, model: WholesalerModel) -> WholesalerResponse {
        WholesalerResponse {
            id: model.id,
            name: model.name,
            phone: model.phone,
            address: model.address,
            notes: model.notes,
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
        let model = WholesalerModel {
            id,
            name: "Aurum Trading".to_string(),
            phone: Some("+30 210 1234567".to_string()),
            address: Some("12 Ermou St, Athens".to_string()),
            notes: None,
            created_at: now,
            updated_at: Some(now),
        };

        let service = WholesalerService::new(Arc::new(DatabaseConnection::Disconnected), None);
        let response = service.model_to_response(model);

        assert_eq!(response.id, id);
        assert_eq!(response.name, "Aurum Trading");
        assert_eq!(response.phone.as_deref(), Some("+30 210 1234567"));
        assert_eq!(response.updated_at, Some(now));
    }

    #[test]
    fn update_request_rejects_overlong_name() {
        let request = UpdateWholesalerRequest {
            name: "x".repeat(121),
            phone: None,
            address: None,
            notes: None,
        };
        assert!(request.validate().is_err());
    }
}
