use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// One row per document regardless of kind (scenario, order or supply).
///
/// The `total_*` columns are derived from the document's transaction lines
/// by the aggregator on every save; they are never written independently.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub kind: String,

    #[validate(length(
        min = 1,
        max = 50,
        message = "Document number must be between 1 and 50 characters"
    ))]
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
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wholesaler::Entity",
        from = "Column::WholesalerId",
        to = "super::wholesaler::Column::Id"
    )]
    Wholesaler,
    #[sea_orm(has_many = "super::transaction_line::Entity")]
    TransactionLines,
}

impl Related<super::wholesaler::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wholesaler.def()
    }
}

impl Related<super::transaction_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TransactionLines.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
            if let ActiveValue::NotSet = active_model.updated_at {
                active_model.updated_at = Set(Some(now));
            }
        } else {
            active_model.updated_at = Set(Some(now));
        }

        Ok(active_model)
    }
}
