use crate::{
    db::DbPool,
    entities::{
        document::{self, ActiveModel as DocumentActiveModel, Entity as DocumentEntity, Model as DocumentModel},
        gold_rate::{self, Entity as GoldRateEntity},
        product::{self, Entity as ProductEntity},
        transaction_line::{self, Entity as TransactionLineEntity, Model as LineModel},
        wholesaler::Entity as WholesalerEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    valuation::{
        document_changed, normalize, Carat, Direction, DocumentDraft, DocumentKind,
        DocumentTotals, FulfillmentStatus, LineType, ProductSnapshot, TransactionLine,
    },
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One submitted transaction line. The client sends whatever the operator
/// typed; the service strips foreign fields and re-derives the computed ones
/// before anything is stored, so a tampered payload cannot skew totals.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LinePayload {
    #[schema(value_type = String)]
    pub line_type: LineType,
    #[schema(value_type = String)]
    pub direction: Direction,
    pub product_id: Option<Uuid>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    pub weight_brut: Option<Decimal>,
    pub carat: Option<i16>,
    pub agreed_milliemes: Option<i32>,
    pub weight24k: Option<Decimal>,
    pub agreed_weight24k: Option<Decimal>,
    pub agreed_price: Option<Decimal>,
    pub amount: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub status: Option<FulfillmentStatus>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateDocumentRequest {
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub wholesaler_id: Option<Uuid>,
    /// Defaults to now.
    pub document_date: Option<DateTime<Utc>>,
    /// Defaults to the latest recorded gold rate.
    pub agreed_gold_rate: Option<Decimal>,
    #[serde(default)]
    #[validate]
    pub lines: Vec<LinePayload>,
}

/// Full-state replacement: metadata and the complete line list. A submission
/// identical to what is stored is detected and skipped without a write.
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateDocumentRequest {
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub wholesaler_id: Option<Uuid>,
    /// Keeps the stored date when omitted.
    pub document_date: Option<DateTime<Utc>>,
    pub agreed_gold_rate: Decimal,
    #[serde(default)]
    #[validate]
    pub lines: Vec<LinePayload>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateLineStatusRequest {
    #[schema(value_type = String)]
    pub status: FulfillmentStatus,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LineResponse {
    pub id: Uuid,
    pub position: i32,
    pub line_type: String,
    pub direction: String,
    pub product_id: Option<Uuid>,
    pub is_gold: bool,
    pub contains_gold: bool,
    pub quantity: Option<i32>,
    pub weight_brut: Option<Decimal>,
    pub carat: Option<i16>,
    pub agreed_milliemes: Option<i32>,
    pub weight24k: Option<Decimal>,
    pub agreed_weight24k: Option<Decimal>,
    pub agreed_price: Option<Decimal>,
    pub amount: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub kind: String,
    pub number: String,
    pub description: Option<String>,
    pub wholesaler_id: Option<Uuid>,
    pub document_date: DateTime<Utc>,
    pub agreed_gold_rate: Decimal,
    pub total24k_product_in: Decimal,
    pub total24k_product_out: Decimal,
    pub total24k_scrap_in: Decimal,
    pub total24k_scrap_out: Decimal,
    pub total24k_in: Decimal,
    pub total24k_out: Decimal,
    pub total24k: Decimal,
    pub total_cash_in: Decimal,
    pub total_cash_out: Decimal,
    pub total_bank_in: Decimal,
    pub total_bank_out: Decimal,
    pub total_money_in: Decimal,
    pub total_money_out: Decimal,
    pub total_money: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Present on single-document reads, omitted from listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<LineResponse>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Service for scenarios, orders and supplies.
///
/// All three kinds share one storage shape and one valuation pipeline; the
/// kind only decides the number prefix and whether fulfillment status is
/// tracked. Every write runs the submitted lines through
/// [`normalize`] and re-aggregates the totals, so stored figures are always
/// consistent with the stored lines.
#[derive(Clone)]
pub struct DocumentService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl DocumentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a document of the given kind from the submitted lines
    #[instrument(skip(self, request), fields(kind = %kind, line_count = request.lines.len()))]
    pub async fn create_document(
        &self,
        kind: DocumentKind,
        request: CreateDocumentRequest,
    ) -> Result<DocumentResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let rate = match request.agreed_gold_rate {
            Some(rate) => rate,
            None => self.latest_recorded_rate().await?,
        };
        if rate <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Agreed gold rate must be positive".to_string(),
            ));
        }
        self.check_wholesaler_exists(request.wholesaler_id).await?;

        let lines = self.resolve_lines(kind, rate, &request.lines).await?;
        let totals = DocumentTotals::aggregate(&lines);

        let document_id = Uuid::new_v4();
        let document_date = request.document_date.unwrap_or_else(Utc::now);

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for document creation");
            ServiceError::DatabaseError(e)
        })?;

        let number = self.next_number(&txn, kind).await?;

        let mut active_model = DocumentActiveModel {
            id: Set(document_id),
            kind: Set(kind.to_string()),
            number: Set(number),
            description: Set(request.description),
            wholesaler_id: Set(request.wholesaler_id),
            document_date: Set(document_date),
            agreed_gold_rate: Set(rate),
            ..Default::default()
        };
        apply_totals(&mut active_model, &totals);

        let model = active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to create document");
            ServiceError::DatabaseError(e)
        })?;

        let mut stored_lines = Vec::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let stored = line_to_active_model(document_id, position as i32, line)
                .insert(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, document_id = %document_id, position = position, "Failed to store transaction line");
                    ServiceError::DatabaseError(e)
                })?;
            stored_lines.push(stored);
        }

        txn.commit().await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to commit document creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            document_id = %document_id,
            number = %model.number,
            total24k = %model.total24k,
            total_money = %model.total_money,
            "Document created"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::DocumentCreated {
                    document_id,
                    kind: kind.to_string(),
                })
                .await
            {
                warn!(error = %e, document_id = %document_id, "Failed to send document created event");
            }
        }

        Ok(model_to_response(model, Some(stored_lines)))
    }

    /// Retrieves a document with its lines in position order
    #[instrument(skip(self), fields(kind = %kind, document_id = %document_id))]
    pub async fn get_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Option<DocumentResponse>, ServiceError> {
        let db = &*self.db_pool;

        let document = self.find_document(kind, document_id).await?;
        let Some(document) = document else {
            return Ok(None);
        };

        let lines = TransactionLineEntity::find()
            .filter(transaction_line::Column::DocumentId.eq(document_id))
            .order_by_asc(transaction_line::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to fetch transaction lines");
                ServiceError::DatabaseError(e)
            })?;

        Ok(Some(model_to_response(document, Some(lines))))
    }

    /// Lists documents of one kind, newest first, without their lines
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn list_documents(
        &self,
        kind: DocumentKind,
        page: u64,
        per_page: u64,
    ) -> Result<DocumentListResponse, ServiceError> {
        let db = &*self.db_pool;

        let paginator = DocumentEntity::find()
            .filter(document::Column::Kind.eq(kind.to_string()))
            .order_by_desc(document::Column::DocumentDate)
            .order_by_desc(document::Column::CreatedAt)
            .paginate(db, per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count documents");
            ServiceError::DatabaseError(e)
        })?;

        let documents = paginator.fetch_page(page - 1).await.map_err(|e| {
            error!(error = %e, page = page, per_page = per_page, "Failed to fetch documents page");
            ServiceError::DatabaseError(e)
        })?;

        Ok(DocumentListResponse {
            documents: documents
                .into_iter()
                .map(|model| model_to_response(model, None))
                .collect(),
            total,
            page,
            per_page,
        })
    }

    /// Replaces a document's metadata and lines, re-running the valuation.
    ///
    /// The stored document and the submission are first compared as drafts;
    /// when nothing differs the stored row is returned untouched, so an
    /// editor that saves without changes causes no write and no bumped
    /// `updated_at`.
    #[instrument(skip(self, request), fields(kind = %kind, document_id = %document_id, line_count = request.lines.len()))]
    pub async fn update_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
        request: UpdateDocumentRequest,
    ) -> Result<DocumentResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        if request.agreed_gold_rate <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Agreed gold rate must be positive".to_string(),
            ));
        }

        let db = &*self.db_pool;

        let document = self
            .find_document(kind, document_id)
            .await?
            .ok_or_else(|| {
                warn!(document_id = %document_id, "Document not found for update");
                ServiceError::NotFound(format!("Document {} not found", document_id))
            })?;
        self.check_wholesaler_exists(request.wholesaler_id).await?;

        let stored_lines = TransactionLineEntity::find()
            .filter(transaction_line::Column::DocumentId.eq(document_id))
            .order_by_asc(transaction_line::Column::Position)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to fetch transaction lines");
                ServiceError::DatabaseError(e)
            })?;

        let before = DocumentDraft {
            kind,
            description: document.description.clone(),
            wholesaler_id: document.wholesaler_id,
            document_date: document.document_date,
            agreed_gold_rate: document.agreed_gold_rate,
            lines: stored_lines
                .iter()
                .map(line_model_to_domain)
                .collect::<Result<Vec<_>, _>>()?,
        };

        let rate = request.agreed_gold_rate;
        let lines = self.resolve_lines(kind, rate, &request.lines).await?;
        let after = DocumentDraft {
            kind,
            description: request.description,
            wholesaler_id: request.wholesaler_id,
            document_date: request.document_date.unwrap_or(document.document_date),
            agreed_gold_rate: rate,
            lines,
        };

        if !document_changed(&before, &after) {
            info!(document_id = %document_id, "Submission matches stored document, skipping write");
            return Ok(model_to_response(document, Some(stored_lines)));
        }

        let totals = DocumentTotals::aggregate(&after.lines);

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to start transaction for document update");
            ServiceError::DatabaseError(e)
        })?;

        TransactionLineEntity::delete_many()
            .filter(transaction_line::Column::DocumentId.eq(document_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to clear transaction lines");
                ServiceError::DatabaseError(e)
            })?;

        let mut stored_lines = Vec::with_capacity(after.lines.len());
        for (position, line) in after.lines.iter().enumerate() {
            let stored = line_to_active_model(document_id, position as i32, line)
                .insert(&txn)
                .await
                .map_err(|e| {
                    error!(error = %e, document_id = %document_id, position = position, "Failed to store transaction line");
                    ServiceError::DatabaseError(e)
                })?;
            stored_lines.push(stored);
        }

        let mut active_model: DocumentActiveModel = document.into();
        active_model.description = Set(after.description.clone());
        active_model.wholesaler_id = Set(after.wholesaler_id);
        active_model.document_date = Set(after.document_date);
        active_model.agreed_gold_rate = Set(after.agreed_gold_rate);
        apply_totals(&mut active_model, &totals);

        let updated = active_model.update(&txn).await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to update document");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to commit document update transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            document_id = %document_id,
            total24k = %updated.total24k,
            total_money = %updated.total_money,
            "Document updated"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::DocumentUpdated {
                    document_id,
                    kind: kind.to_string(),
                })
                .await
            {
                warn!(error = %e, document_id = %document_id, "Failed to send document updated event");
            }
        }

        Ok(model_to_response(updated, Some(stored_lines)))
    }

    /// Deletes a document and its lines
    #[instrument(skip(self), fields(kind = %kind, document_id = %document_id))]
    pub async fn delete_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let document = self
            .find_document(kind, document_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Document {} not found", document_id)))?;

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to start transaction for document deletion");
            ServiceError::DatabaseError(e)
        })?;

        TransactionLineEntity::delete_many()
            .filter(transaction_line::Column::DocumentId.eq(document_id))
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to delete transaction lines");
                ServiceError::DatabaseError(e)
            })?;

        DocumentEntity::delete_by_id(document.id)
            .exec(&txn)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to delete document");
                ServiceError::DatabaseError(e)
            })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, document_id = %document_id, "Failed to commit document deletion transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(document_id = %document_id, number = %document.number, "Document deleted");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::DocumentDeleted {
                    document_id,
                    kind: kind.to_string(),
                })
                .await
            {
                warn!(error = %e, document_id = %document_id, "Failed to send document deleted event");
            }
        }

        Ok(())
    }

    /// Moves one outgoing product line of an order through its fulfillment
    /// states. Only orders track fulfillment, and only on lines that hand
    /// goods to the customer.
    #[instrument(skip(self, request), fields(document_id = %document_id, line_id = %line_id))]
    pub async fn update_line_status(
        &self,
        document_id: Uuid,
        line_id: Uuid,
        request: UpdateLineStatusRequest,
    ) -> Result<LineResponse, ServiceError> {
        let db = &*self.db_pool;

        self.find_document(DocumentKind::Order, document_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", document_id)))?;

        let line = TransactionLineEntity::find_by_id(line_id)
            .filter(transaction_line::Column::DocumentId.eq(document_id))
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, line_id = %line_id, "Failed to fetch transaction line");
                ServiceError::DatabaseError(e)
            })?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Line {} not found in order {}",
                    line_id, document_id
                ))
            })?;

        if line.line_type != LineType::Product.to_string()
            || line.direction != Direction::Out.to_string()
        {
            return Err(ServiceError::InvalidOperation(
                "Only outgoing product lines carry a fulfillment status".to_string(),
            ));
        }

        let old_status = line.status.clone().unwrap_or_default();
        let new_status = request.status.to_string();

        let mut active_model: transaction_line::ActiveModel = line.into();
        active_model.status = Set(Some(new_status.clone()));

        let updated = active_model.update(db).await.map_err(|e| {
            error!(error = %e, line_id = %line_id, "Failed to update line status");
            ServiceError::DatabaseError(e)
        })?;

        info!(
            document_id = %document_id,
            line_id = %line_id,
            old_status = %old_status,
            new_status = %new_status,
            "Order line status changed"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::OrderLineStatusChanged {
                    document_id,
                    line_id,
                    old_status,
                    new_status,
                })
                .await
            {
                warn!(error = %e, line_id = %line_id, "Failed to send line status event");
            }
        }

        Ok(line_model_to_response(updated))
    }

    async fn find_document(
        &self,
        kind: DocumentKind,
        document_id: Uuid,
    ) -> Result<Option<DocumentModel>, ServiceError> {
        DocumentEntity::find_by_id(document_id)
            .filter(document::Column::Kind.eq(kind.to_string()))
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(error = %e, document_id = %document_id, "Failed to fetch document");
                ServiceError::DatabaseError(e)
            })
    }

    async fn latest_recorded_rate(&self) -> Result<Decimal, ServiceError> {
        let latest = GoldRateEntity::find()
            .order_by_desc(gold_rate::Column::RecordedAt)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?;

        latest.map(|model| model.rate).ok_or_else(|| {
            ServiceError::ValidationError(
                "No gold rate recorded yet; supply agreed_gold_rate explicitly".to_string(),
            )
        })
    }

    async fn check_wholesaler_exists(
        &self,
        wholesaler_id: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let Some(wholesaler_id) = wholesaler_id else {
            return Ok(());
        };

        let exists = WholesalerEntity::find_by_id(wholesaler_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::DatabaseError)?
            .is_some();

        if !exists {
            return Err(ServiceError::ValidationError(format!(
                "wholesaler_id references an unknown wholesaler ({})",
                wholesaler_id
            )));
        }
        Ok(())
    }

    /// Turns submitted payloads into normalized domain lines, resolving
    /// product references against the catalog in one query.
    async fn resolve_lines(
        &self,
        kind: DocumentKind,
        rate: Decimal,
        payloads: &[LinePayload],
    ) -> Result<Vec<TransactionLine>, ServiceError> {
        let product_ids: Vec<Uuid> = payloads
            .iter()
            .filter(|p| p.line_type == LineType::Product)
            .filter_map(|p| p.product_id)
            .collect();

        let products: HashMap<Uuid, product::Model> = if product_ids.is_empty() {
            HashMap::new()
        } else {
            ProductEntity::find()
                .filter(product::Column::Id.is_in(product_ids))
                .all(&*self.db_pool)
                .await
                .map_err(ServiceError::DatabaseError)?
                .into_iter()
                .map(|model| (model.id, model))
                .collect()
        };

        let mut lines = Vec::with_capacity(payloads.len());
        for (position, payload) in payloads.iter().enumerate() {
            let product = match payload.line_type {
                LineType::Product => {
                    let product_id = payload.product_id.ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Line {} is a product line without a product_id",
                            position
                        ))
                    })?;
                    let model = products.get(&product_id).ok_or_else(|| {
                        ServiceError::ValidationError(format!(
                            "Line {} references an unknown product ({})",
                            position, product_id
                        ))
                    })?;
                    Some(ProductSnapshot {
                        id: model.id,
                        is_gold: model.is_gold,
                        contains_gold: model.contains_gold,
                        carat: None,
                        weight_brut: None,
                    })
                }
                _ => None,
            };

            let mut status = payload.status;
            if kind == DocumentKind::Order
                && payload.line_type == LineType::Product
                && payload.direction == Direction::Out
                && status.is_none()
            {
                status = Some(FulfillmentStatus::ToBeOrdered);
            }

            let line = TransactionLine {
                line_type: payload.line_type,
                direction: payload.direction,
                product,
                quantity: payload.quantity,
                weight_brut: payload.weight_brut,
                carat: payload.carat.map(Carat::from),
                agreed_milliemes: payload.agreed_milliemes,
                weight24k: payload.weight24k,
                agreed_weight24k: payload.agreed_weight24k,
                agreed_price: payload.agreed_price,
                amount: payload.amount,
                status,
            };
            lines.push(normalize(&line, kind, rate));
        }
        Ok(lines)
    }

    /// Next document number for the kind, e.g. `ORD-000042`. Runs inside the
    /// insert transaction; the unique index on `number` turns a race between
    /// two servers into a conflict instead of a duplicate.
    async fn next_number(
        &self,
        txn: &sea_orm::DatabaseTransaction,
        kind: DocumentKind,
    ) -> Result<String, ServiceError> {
        let existing = DocumentEntity::find()
            .filter(document::Column::Kind.eq(kind.to_string()))
            .count(txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(format_number(kind, existing + 1))
    }
}

fn format_number(kind: DocumentKind, sequence: u64) -> String {
    format!("{}-{:06}", kind.number_prefix(), sequence)
}

/// Rebuilds the domain form of a stored line. The product snapshot carries
/// the flags frozen at write time; catalog prefills (carat, gross weight) are
/// an editor concern and stay out of it, so a stored line and its resubmitted
/// twin compare equal.
fn line_model_to_domain(model: &LineModel) -> Result<TransactionLine, ServiceError> {
    let line_type: LineType = model.line_type.parse().map_err(|_| {
        ServiceError::InternalError(format!(
            "Stored line {} has unknown type '{}'",
            model.id, model.line_type
        ))
    })?;
    let direction: Direction = model.direction.parse().map_err(|_| {
        ServiceError::InternalError(format!(
            "Stored line {} has unknown direction '{}'",
            model.id, model.direction
        ))
    })?;
    let status = model
        .status
        .as_deref()
        .map(|raw| {
            raw.parse::<FulfillmentStatus>().map_err(|_| {
                ServiceError::InternalError(format!(
                    "Stored line {} has unknown status '{}'",
                    model.id, raw
                ))
            })
        })
        .transpose()?;

    let product = match (line_type, model.product_id) {
        (LineType::Product, Some(product_id)) => Some(ProductSnapshot {
            id: product_id,
            is_gold: model.is_gold,
            contains_gold: model.contains_gold,
            carat: None,
            weight_brut: None,
        }),
        _ => None,
    };

    Ok(TransactionLine {
        line_type,
        direction,
        product,
        quantity: model.quantity,
        weight_brut: model.weight_brut,
        carat: model.carat.map(Carat::from),
        agreed_milliemes: model.agreed_milliemes,
        weight24k: model.weight24k,
        agreed_weight24k: model.agreed_weight24k,
        agreed_price: model.agreed_price,
        amount: model.amount,
        status,
    })
}

fn line_to_active_model(
    document_id: Uuid,
    position: i32,
    line: &TransactionLine,
) -> transaction_line::ActiveModel {
    transaction_line::ActiveModel {
        id: Set(Uuid::new_v4()),
        document_id: Set(document_id),
        position: Set(position),
        line_type: Set(line.line_type.to_string()),
        direction: Set(line.direction.to_string()),
        product_id: Set(line.product.as_ref().map(|p| p.id)),
        is_gold: Set(line.is_gold()),
        contains_gold: Set(line.product.as_ref().map(|p| p.contains_gold).unwrap_or(false)),
        quantity: Set(line.quantity),
        weight_brut: Set(line.weight_brut),
        carat: Set(line.carat.map(i16::from)),
        agreed_milliemes: Set(line.agreed_milliemes),
        weight24k: Set(line.weight24k),
        agreed_weight24k: Set(line.agreed_weight24k),
        agreed_price: Set(line.agreed_price),
        amount: Set(line.amount),
        status: Set(line.status.map(|s| s.to_string())),
        ..Default::default()
    }
}

fn line_model_to_response(model: LineModel) -> LineResponse {
    LineResponse {
        id: model.id,
        position: model.position,
        line_type: model.line_type,
        direction: model.direction,
        product_id: model.product_id,
        is_gold: model.is_gold,
        contains_gold: model.contains_gold,
        quantity: model.quantity,
        weight_brut: model.weight_brut,
        carat: model.carat,
        agreed_milliemes: model.agreed_milliemes,
        weight24k: model.weight24k,
        agreed_weight24k: model.agreed_weight24k,
        agreed_price: model.agreed_price,
        amount: model.amount,
        status: model.status,
    }
}

fn apply_totals(active_model: &mut DocumentActiveModel, totals: &DocumentTotals) {
    active_model.total24k_product_in = Set(totals.total24k_product_in);
    active_model.total24k_product_out = Set(totals.total24k_product_out);
    active_model.total24k_scrap_in = Set(totals.total24k_scrap_in);
    active_model.total24k_scrap_out = Set(totals.total24k_scrap_out);
    active_model.total24k_in = Set(totals.total24k_in);
    active_model.total24k_out = Set(totals.total24k_out);
    active_model.total24k = Set(totals.total24k);
    active_model.total_cash_in = Set(totals.total_cash_in);
    active_model.total_cash_out = Set(totals.total_cash_out);
    active_model.total_bank_in = Set(totals.total_bank_in);
    active_model.total_bank_out = Set(totals.total_bank_out);
    active_model.total_money_in = Set(totals.total_money_in);
    active_model.total_money_out = Set(totals.total_money_out);
    active_model.total_money = Set(totals.total_money);
}

fn model_to_response(model: DocumentModel, lines: Option<Vec<LineModel>>) -> DocumentResponse {
    DocumentResponse {
        id: model.id,
        kind: model.kind,
        number: model.number,
        description: model.description,
        wholesaler_id: model.wholesaler_id,
        document_date: model.document_date,
        agreed_gold_rate: model.agreed_gold_rate,
        total24k_product_in: model.total24k_product_in,
        total24k_product_out: model.total24k_product_out,
        total24k_scrap_in: model.total24k_scrap_in,
        total24k_scrap_out: model.total24k_scrap_out,
        total24k_in: model.total24k_in,
        total24k_out: model.total24k_out,
        total24k: model.total24k,
        total_cash_in: model.total_cash_in,
        total_cash_out: model.total_cash_out,
        total_bank_in: model.total_bank_in,
        total_bank_out: model.total_bank_out,
        total_money_in: model.total_money_in,
        total_money_out: model.total_money_out,
        total_money: model.total_money,
        created_at: model.created_at,
        updated_at: model.updated_at,
        lines: lines.map(|models| models.into_iter().map(line_model_to_response).collect()),
    }
}
