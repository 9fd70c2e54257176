use crate::{
    db::DbPool,
    entities::gold_rate::{self, ActiveModel as GoldRateActiveModel, Entity as GoldRateEntity, Model as GoldRateModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordGoldRateRequest {
    /// Price of one gram of 24k gold.
    pub rate: Decimal,
    /// Defaults to the current time when omitted.
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateGoldRateRequest {
    pub rate: Decimal,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GoldRateResponse {
    pub id: Uuid,
    pub rate: Decimal,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GoldRateListResponse {
    pub rates: Vec<GoldRateResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for the daily gold rate history.
///
/// Rates recorded here only seed new documents; every document pins its own
/// agreed rate at save time, so editing history never re-values anything.
#[derive(Clone)]
pub struct GoldRateService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl GoldRateService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a new gold rate observation
    #[instrument(skip(self, request), fields(rate = %request.rate))]
    pub async fn record_rate(
        &self,
        request: RecordGoldRateRequest,
    ) -> Result<GoldRateResponse, ServiceError> {
        check_rate(request.rate)?;

        let db = &*self.db_pool;
        let rate_id = Uuid::new_v4();
        let now = Utc::now();

        let active_model = GoldRateActiveModel {
            id: Set(rate_id),
            rate: Set(request.rate),
            recorded_at: Set(request.recorded_at.unwrap_or(now)),
            created_at: Set(now),
        };

        let model = active_model.insert(db).await.map_err(|e| {
            error!(error = %e, rate_id = %rate_id, "Failed to record gold rate");
            ServiceError::DatabaseError(e)
        })?;

        info!(rate_id = %rate_id, rate = %model.rate, "Gold rate recorded");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::GoldRateRecorded {
                    rate_id,
                    rate: model.rate,
                })
                .await
            {
                warn!(error = %e, rate_id = %rate_id, "Failed to send gold rate recorded event");
            }
        }

        Ok(self.model_to_response(model))
    }

    /// Retrieves a rate by ID
    #[instrument(skip(self), fields(rate_id = %rate_id))]
    pub async fn get_rate(&self, rate_id: Uuid) -> Result<Option<GoldRateResponse>, ServiceError> {
        let db = &*self.db_pool;

        let rate = GoldRateEntity::find_by_id(rate_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rate_id = %rate_id, "Failed to fetch gold rate");
                ServiceError::DatabaseError(e)
            })?;

        Ok(rate.map(|model| self.model_to_response(model)))
    }

    /// The most recently recorded rate, used to seed new documents
    #[instrument(skip(self))]
    pub async fn latest_rate(&self) -> Result<Option<GoldRateResponse>, ServiceError> {
        let db = &*self.db_pool;

        let rate = GoldRateEntity::find()
            .order_by_desc(gold_rate::Column::RecordedAt)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch latest gold rate");
                ServiceError::DatabaseError(e)
            })?;

        Ok(rate.map(|model| self.model_to_response(model)))
    }

    /// Lists recorded rates, newest first
    #[instrument(skip(self))]
    pub async fn list_rates(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<GoldRateListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = GoldRateEntity::find()
            .order_by_desc(gold_rate::Column::RecordedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count gold rates");
            ServiceError::DatabaseError(e)
        })?;

        let rates = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch gold rates page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(GoldRateListResponse {
            rates: rates
                .into_iter()
                .map(|model| self.model_to_response(model))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Corrects a mis-entered rate observation
    #[instrument(skip(self, request), fields(rate_id = %rate_id))]
    pub async fn update_rate(
        &self,
        rate_id: Uuid,
        request: UpdateGoldRateRequest,
    ) -> Result<GoldRateResponse, ServiceError> {
        check_rate(request.rate)?;

        let db = &*self.db_pool;

        let rate = GoldRateEntity::find_by_id(rate_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, rate_id = %rate_id, "Failed to find gold rate for update");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                warn!(rate_id = %rate_id, "Gold rate not found for update");
                ServiceError::NotFound(format!("Gold rate {} not found", rate_id))
            })?;

        let recorded_at = request.recorded_at.unwrap_or(rate.recorded_at);
        let mut active_model: GoldRateActiveModel = rate.into();
        active_model.rate = Set(request.rate);
        active_model.recorded_at = Set(recorded_at);

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, rate_id = %rate_id, "Failed to update gold rate");
            ServiceError::DatabaseError(e)
        })?;

        info!(rate_id = %rate_id, rate = %updated.rate, "Gold rate updated");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::GoldRateUpdated(rate_id)).await {
                warn!(error = %e, rate_id = %rate_id, "Failed to send gold rate updated event");
            }
        }

        Ok(self.model_to_response(updated))
    }

    /// Deletes a rate observation. Documents keep their pinned agreed rate.
    #[instrument(skip(self), fields(rate_id = %rate_id))]
    pub async fn delete_rate(&self, rate_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = GoldRateEntity::delete_by_id(rate_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, rate_id = %rate_id, "Failed to delete gold rate");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Gold rate {} not found",
                rate_id
            )));
        }

        info!(rate_id = %rate_id, "Gold rate deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::GoldRateDeleted(rate_id)).await {
                warn!(error = %e, rate_id = %rate_id, "Failed to send gold rate deleted event");
            }
        }

        Ok(())
    }

    fn model_to_response(&self, model: GoldRateModel) -> GoldRateResponse {
        GoldRateResponse {
            id: model.id,
            rate: model.rate,
            recorded_at: model.recorded_at,
            created_at: model.created_at,
        }
    }
}

fn check_rate(rate: Decimal) -> Result<(), ServiceError> {
    if rate <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "rate must be positive".to_string(),
        ));
    }
    Ok(())
}
