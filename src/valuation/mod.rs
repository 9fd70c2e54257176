//! Transaction valuation and document aggregation.
//!
//! Everything here is pure arithmetic over [`rust_decimal::Decimal`]: no I/O
//! and no database types. The service layer feeds stored rows in and writes
//! the recomputed values back out, and the client-side editor drives the same
//! code paths, so both ends of the wire agree on every derived figure.

pub mod diff;
pub mod editor;
pub mod recalc;
pub mod totals;

pub use diff::document_changed;
pub use editor::{DocumentEditor, EditorError, EditorState, Submission};
pub use recalc::{normalize, recalculate, rederive, LineEdit};
pub use totals::DocumentTotals;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monetary values carry 2 decimal places.
pub const MONEY_DP: u32 = 2;
/// Weights carry 4 decimal places.
pub const WEIGHT_DP: u32 = 4;

/// Round a monetary value to its storage precision.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a weight to its storage precision.
pub fn round_weight(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(WEIGHT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Recognised carat tiers. Anything outside the fixed set collapses to
/// [`Carat::Unrated`], whose purity is zero, so an unknown tier yields a zero
/// weight rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i16", into = "i16")]
pub enum Carat {
    K24,
    K22,
    K21,
    K20,
    K18,
    K16,
    K14,
    K12,
    K10,
    K8,
    Unrated,
}

impl Carat {
    /// Catalog purity fraction for this tier.
    pub fn purity(self) -> Decimal {
        match self {
            Carat::K24 => dec!(1.000),
            Carat::K22 => dec!(0.916),
            Carat::K21 => dec!(0.875),
            Carat::K20 => dec!(0.833),
            Carat::K18 => dec!(0.750),
            Carat::K16 => dec!(0.666),
            Carat::K14 => dec!(0.583),
            Carat::K12 => dec!(0.500),
            Carat::K10 => dec!(0.416),
            Carat::K8 => dec!(0.333),
            Carat::Unrated => Decimal::ZERO,
        }
    }

    /// Millesimal form of the catalog purity (22 carat -> 916). Seeds
    /// `agreed_milliemes` when a catalog product is picked.
    pub fn milliemes(self) -> i32 {
        (self.purity() * dec!(1000)).to_i32().unwrap_or(0)
    }
}

impl From<i16> for Carat {
    fn from(raw: i16) -> Self {
        match raw {
            24 => Carat::K24,
            22 => Carat::K22,
            21 => Carat::K21,
            20 => Carat::K20,
            18 => Carat::K18,
            16 => Carat::K16,
            14 => Carat::K14,
            12 => Carat::K12,
            10 => Carat::K10,
            8 => Carat::K8,
            _ => Carat::Unrated,
        }
    }
}

impl From<Carat> for i16 {
    fn from(carat: Carat) -> Self {
        match carat {
            Carat::K24 => 24,
            Carat::K22 => 22,
            Carat::K21 => 21,
            Carat::K20 => 20,
            Carat::K18 => 18,
            Carat::K16 => 16,
            Carat::K14 => 14,
            Carat::K12 => 12,
            Carat::K10 => 10,
            Carat::K8 => 8,
            Carat::Unrated => 0,
        }
    }
}

/// Discriminates which formula branch applies to a line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum LineType {
    Product,
    Scrap,
    Cash,
    Bank,
    Money,
}

/// Flow direction of a line relative to the shop.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum Direction {
    In,
    Out,
}

/// Fulfillment state of an outgoing product line inside an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum FulfillmentStatus {
    ToBeOrdered,
    AwaitingWholesaler,
    AwaitingCustomer,
    HandedOut,
}

/// The three transactional document families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum DocumentKind {
    Scenario,
    Order,
    Supply,
}

impl DocumentKind {
    /// Prefix used when generating document numbers.
    pub fn number_prefix(self) -> &'static str {
        match self {
            DocumentKind::Scenario => "SCN",
            DocumentKind::Order => "ORD",
            DocumentKind::Supply => "SUP",
        }
    }

    /// Plural noun used in API routes and permission messages.
    pub fn collection_name(self) -> &'static str {
        match self {
            DocumentKind::Scenario => "scenarios",
            DocumentKind::Order => "orders",
            DocumentKind::Supply => "supplies",
        }
    }

    /// Capitalized singular noun for user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            DocumentKind::Scenario => "Scenario",
            DocumentKind::Order => "Order",
            DocumentKind::Supply => "Supply",
        }
    }
}

/// The slice of a catalog product the recalculator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: Uuid,
    pub is_gold: bool,
    pub contains_gold: bool,
    pub carat: Option<Carat>,
    pub weight_brut: Option<Decimal>,
}

/// One line item of a document.
///
/// Fields outside the line's formula branch stay `None`; [`recalc::normalize`]
/// enforces that before a document is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    pub line_type: LineType,
    pub direction: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_brut: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carat: Option<Carat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreed_milliemes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight24k: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreed_weight24k: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agreed_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FulfillmentStatus>,
}

impl TransactionLine {
    /// An empty line of the given type and direction.
    pub fn new(line_type: LineType, direction: Direction) -> Self {
        Self {
            line_type,
            direction,
            product: None,
            quantity: None,
            weight_brut: None,
            carat: None,
            agreed_milliemes: None,
            weight24k: None,
            agreed_weight24k: None,
            agreed_price: None,
            amount: None,
            status: None,
        }
    }

    /// True when the gold formula branch applies: every Scrap line, and
    /// Product lines whose catalog entry is gold.
    pub fn is_gold(&self) -> bool {
        match self.line_type {
            LineType::Scrap => true,
            LineType::Product => self.product.as_ref().map(|p| p.is_gold).unwrap_or(false),
            _ => false,
        }
    }

    /// Quantity as it enters the weight formulas. Scrap is always one lot;
    /// a product line without a quantity contributes nothing.
    pub fn effective_quantity(&self) -> Decimal {
        match self.line_type {
            LineType::Scrap => Decimal::ONE,
            _ => Decimal::from(self.quantity.unwrap_or(0)),
        }
    }
}

/// In-memory form of a document, the unit the editor mutates and a save
/// submits. Identity and numbering are storage concerns and live outside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub kind: DocumentKind,
    pub description: Option<String>,
    pub wholesaler_id: Option<Uuid>,
    pub document_date: DateTime<Utc>,
    pub agreed_gold_rate: Decimal,
    pub lines: Vec<TransactionLine>,
}

impl DocumentDraft {
    /// An empty draft dated now.
    pub fn empty(kind: DocumentKind, agreed_gold_rate: Decimal) -> Self {
        Self {
            kind,
            description: None,
            wholesaler_id: None,
            document_date: Utc::now(),
            agreed_gold_rate,
            lines: Vec::new(),
        }
    }
}
