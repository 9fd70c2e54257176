//! Single-line recalculation.
//!
//! Every user edit is a [`LineEdit`] consumed by [`recalculate`], which
//! returns the fully recomputed line. Each (type, direction, gold-ness)
//! combination has exactly one closed-form branch, so a single pass leaves the
//! line self-consistent; there is no iterative solving and the price-driven
//! and purity-driven derivations cannot oscillate.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use super::{
    round_money, round_weight, Carat, Direction, DocumentKind, LineType, ProductSnapshot,
    TransactionLine,
};

/// A single edit to a transaction line. The variant decides which field is
/// ground truth and which derived fields are recomputed from it.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEdit {
    /// Raw weight changed.
    Weight { weight_brut: Decimal },
    /// Item count changed.
    Quantity { quantity: i32 },
    /// Catalog carat tier changed.
    CaratSet { carat: Carat },
    /// Negotiated millesimal purity changed.
    Milliemes { milliemes: i32 },
    /// Negotiated price changed; purity is re-derived from it.
    Price { price: Decimal },
    /// Monetary amount changed, for cash/bank/money lines.
    Amount { amount: Decimal },
    /// A catalog product was picked for the line.
    ProductSelected { product: ProductSnapshot },
    /// The document's gold rate changed; inputs stay untouched.
    RateApplied,
}

/// Apply one edit and recompute the line's derived fields at the given rate.
pub fn recalculate(line: &TransactionLine, gold_rate: Decimal, edit: &LineEdit) -> TransactionLine {
    let mut next = line.clone();
    apply_edit(&mut next, edit);

    if next.is_gold() {
        match edit {
            LineEdit::Price { .. } => derive_gold_from_price(&mut next, gold_rate),
            _ => derive_gold_from_purity(&mut next, gold_rate),
        }
    } else if next.line_type == LineType::Product {
        let price = next.agreed_price.unwrap_or_default();
        next.agreed_weight24k = Some(round_weight(safe_div(price, gold_rate)));
    } else {
        let amount = next.amount.unwrap_or_default();
        next.agreed_weight24k = Some(round_weight(safe_div(amount, gold_rate)));
    }
    next
}

/// Re-derive a line from its stored inputs, picking the branch the editor
/// would have used: gold lines with a raw weight are purity-driven, gold
/// lines carrying only a price are price-driven. Used when the document rate
/// changes and when a submitted line is recomputed server-side.
pub fn rederive(line: &TransactionLine, gold_rate: Decimal) -> TransactionLine {
    let price_only = line.is_gold()
        && line.weight_brut.unwrap_or_default().is_zero()
        && !line.agreed_price.unwrap_or_default().is_zero();
    if price_only {
        let price = line.agreed_price.unwrap_or_default();
        recalculate(line, gold_rate, &LineEdit::Price { price })
    } else {
        recalculate(line, gold_rate, &LineEdit::RateApplied)
    }
}

/// Strip fields foreign to the line's formula branch, then re-derive the
/// computed ones. Runs before a document is persisted, so cash lines never
/// carry product references and non-gold lines never carry purity fields.
pub fn normalize(
    line: &TransactionLine,
    kind: DocumentKind,
    gold_rate: Decimal,
) -> TransactionLine {
    let mut next = line.clone();
    match next.line_type {
        LineType::Product => {
            next.amount = None;
            if !next.is_gold() {
                next.weight_brut = None;
                next.carat = None;
                next.agreed_milliemes = None;
                next.weight24k = None;
            }
        }
        LineType::Scrap => {
            next.amount = None;
            next.product = None;
            next.quantity = None;
        }
        LineType::Cash | LineType::Bank | LineType::Money => {
            next.product = None;
            next.quantity = None;
            next.weight_brut = None;
            next.carat = None;
            next.agreed_milliemes = None;
            next.weight24k = None;
            next.agreed_price = None;
        }
    }
    let keeps_status = kind == DocumentKind::Order
        && next.line_type == LineType::Product
        && next.direction == Direction::Out;
    if !keeps_status {
        next.status = None;
    }
    rederive(&next, gold_rate)
}

fn apply_edit(line: &mut TransactionLine, edit: &LineEdit) {
    match edit {
        LineEdit::Weight { weight_brut } => line.weight_brut = Some(*weight_brut),
        LineEdit::Quantity { quantity } => line.quantity = Some(*quantity),
        LineEdit::CaratSet { carat } => line.carat = Some(*carat),
        LineEdit::Milliemes { milliemes } => line.agreed_milliemes = Some(*milliemes),
        LineEdit::Price { price } => line.agreed_price = Some(*price),
        LineEdit::Amount { amount } => line.amount = Some(*amount),
        LineEdit::ProductSelected { product } => {
            if product.carat.is_some() {
                line.carat = product.carat;
            }
            if product.weight_brut.is_some() {
                line.weight_brut = product.weight_brut;
            }
            if line.quantity.is_none() {
                line.quantity = Some(1);
            }
            if line.agreed_milliemes.is_none() {
                if let Some(carat) = line.carat {
                    line.agreed_milliemes = Some(carat.milliemes());
                }
            }
            line.product = Some(product.clone());
        }
        LineEdit::RateApplied => {}
    }
}

/// Forward derivation: weight and purity are ground truth.
fn derive_gold_from_purity(line: &mut TransactionLine, gold_rate: Decimal) {
    let brut = line.weight_brut.unwrap_or_default();
    let quantity = line.effective_quantity();
    let purity = line.carat.map(Carat::purity).unwrap_or_default();
    let milliemes = Decimal::from(line.agreed_milliemes.unwrap_or_default());

    line.weight24k = Some(round_weight(brut * purity * quantity));
    let agreed = round_weight(brut * milliemes / dec!(1000) * quantity);
    line.agreed_weight24k = Some(agreed);
    line.agreed_price = Some(round_money(gold_rate * agreed));
}

/// Inverse derivation: the negotiated price is ground truth and the agreed
/// purity falls out of it.
fn derive_gold_from_price(line: &mut TransactionLine, gold_rate: Decimal) {
    let brut = line.weight_brut.unwrap_or_default();
    let quantity = line.effective_quantity();
    let purity = line.carat.map(Carat::purity).unwrap_or_default();
    let price = line.agreed_price.unwrap_or_default();

    line.weight24k = Some(round_weight(brut * purity * quantity));
    let agreed = round_weight(safe_div(price, gold_rate));
    line.agreed_weight24k = Some(agreed);
    let per_gram = safe_div(safe_div(agreed, brut), quantity);
    line.agreed_milliemes = Some(to_rounded_i32(per_gram * dec!(1000)));
}

/// Division under the zero-denominator contract: derived values collapse to
/// zero instead of erroring, so a half-filled form never poisons the document.
fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

fn to_rounded_i32(value: Decimal) -> i32 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i32()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::FulfillmentStatus;
    use uuid::Uuid;

    fn gold_snapshot() -> ProductSnapshot {
        ProductSnapshot {
            id: Uuid::new_v4(),
            is_gold: true,
            contains_gold: false,
            carat: None,
            weight_brut: None,
        }
    }

    fn gold_line(brut: Decimal, carat: Carat, quantity: i32) -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Product, Direction::In);
        line.product = Some(gold_snapshot());
        line.weight_brut = Some(brut);
        line.carat = Some(carat);
        line.quantity = Some(quantity);
        line
    }

    #[test]
    fn catalog_purity_drives_weight24k() {
        let line = gold_line(dec!(10), Carat::K22, 2);
        let out = recalculate(&line, dec!(60), &LineEdit::RateApplied);
        assert_eq!(out.weight24k, Some(dec!(18.3200)));
    }

    #[test]
    fn agreed_milliemes_drive_agreed_weight_and_price() {
        let line = gold_line(dec!(10), Carat::K22, 2);
        let out = recalculate(&line, dec!(60), &LineEdit::Milliemes { milliemes: 900 });
        assert_eq!(out.agreed_weight24k, Some(dec!(18.0000)));
        assert_eq!(out.agreed_price, Some(dec!(1080.00)));
    }

    #[test]
    fn price_edit_rederives_weight_and_milliemes() {
        let mut line = gold_line(dec!(10), Carat::K22, 2);
        line.agreed_milliemes = Some(900);
        let priced = recalculate(&line, dec!(60), &LineEdit::Price { price: dec!(1200) });
        assert_eq!(priced.agreed_weight24k, Some(dec!(20.0000)));
        assert_eq!(priced.agreed_milliemes, Some(1000));
        assert_eq!(priced.agreed_price, Some(dec!(1200)));
    }

    #[test]
    fn milliemes_edit_after_price_edit_wins_without_oscillation() {
        let mut line = gold_line(dec!(10), Carat::K22, 2);
        line.agreed_milliemes = Some(900);
        let priced = recalculate(&line, dec!(60), &LineEdit::Price { price: dec!(1200) });
        let repriced = recalculate(&priced, dec!(60), &LineEdit::Milliemes { milliemes: 950 });
        assert_eq!(repriced.agreed_weight24k, Some(dec!(19.0000)));
        assert_eq!(repriced.agreed_price, Some(dec!(1140.00)));
        // A second pass over the same inputs changes nothing.
        let again = recalculate(&repriced, dec!(60), &LineEdit::RateApplied);
        assert_eq!(again, repriced);
    }

    #[test]
    fn scrap_ignores_quantity() {
        let mut line = TransactionLine::new(LineType::Scrap, Direction::Out);
        line.weight_brut = Some(dec!(5));
        line.carat = Some(Carat::K18);
        line.agreed_milliemes = Some(750);
        line.quantity = Some(3);
        let out = recalculate(&line, dec!(60), &LineEdit::RateApplied);
        assert_eq!(out.weight24k, Some(dec!(3.7500)));
        assert_eq!(out.agreed_weight24k, Some(dec!(3.7500)));
        assert_eq!(out.agreed_price, Some(dec!(225.00)));
    }

    #[test]
    fn non_gold_product_is_priced_in_money_only() {
        let mut line = TransactionLine::new(LineType::Product, Direction::Out);
        line.product = Some(ProductSnapshot {
            is_gold: false,
            ..gold_snapshot()
        });
        let out = recalculate(&line, dec!(50), &LineEdit::Price { price: dec!(125) });
        assert_eq!(out.agreed_weight24k, Some(dec!(2.5000)));
        assert_eq!(out.weight24k, None);
    }

    #[test]
    fn cash_amount_converts_at_the_agreed_rate() {
        let line = TransactionLine::new(LineType::Cash, Direction::In);
        let out = recalculate(&line, dec!(50), &LineEdit::Amount { amount: dec!(500) });
        assert_eq!(out.agreed_weight24k, Some(dec!(10.0000)));
    }

    #[test]
    fn zero_rate_and_zero_weight_short_circuit_to_zero() {
        let line = TransactionLine::new(LineType::Cash, Direction::In);
        let out = recalculate(&line, Decimal::ZERO, &LineEdit::Amount { amount: dec!(500) });
        assert_eq!(out.agreed_weight24k, Some(Decimal::ZERO));

        let mut gold = gold_line(dec!(0), Carat::K22, 2);
        gold.agreed_milliemes = Some(900);
        let priced = recalculate(&gold, dec!(60), &LineEdit::Price { price: dec!(600) });
        assert_eq!(priced.agreed_milliemes, Some(0));
        assert_eq!(priced.weight24k, Some(Decimal::ZERO));
    }

    #[test]
    fn product_selection_prefills_and_locks_catalog_fields() {
        let snapshot = ProductSnapshot {
            id: Uuid::new_v4(),
            is_gold: true,
            contains_gold: true,
            carat: Some(Carat::K21),
            weight_brut: Some(dec!(4.2)),
        };
        let line = TransactionLine::new(LineType::Product, Direction::Out);
        let out = recalculate(&line, dec!(60), &LineEdit::ProductSelected { product: snapshot });
        assert_eq!(out.carat, Some(Carat::K21));
        assert_eq!(out.weight_brut, Some(dec!(4.2)));
        assert_eq!(out.quantity, Some(1));
        assert_eq!(out.agreed_milliemes, Some(875));
        assert_eq!(out.weight24k, Some(dec!(3.6750)));
        assert_eq!(out.agreed_weight24k, Some(dec!(3.6750)));
        assert_eq!(out.agreed_price, Some(dec!(220.50)));
    }

    #[test]
    fn rate_change_revalues_from_physical_inputs() {
        let mut line = gold_line(dec!(10), Carat::K22, 2);
        line.agreed_milliemes = Some(900);
        let at_sixty = recalculate(&line, dec!(60), &LineEdit::RateApplied);
        let at_seventy = rederive(&at_sixty, dec!(70));
        assert_eq!(at_seventy.agreed_weight24k, Some(dec!(18.0000)));
        assert_eq!(at_seventy.agreed_price, Some(dec!(1260.00)));
    }

    #[test]
    fn rederive_keeps_price_driven_lines_price_driven() {
        let mut line = TransactionLine::new(LineType::Scrap, Direction::In);
        line.agreed_price = Some(dec!(300));
        let out = rederive(&line, dec!(60));
        assert_eq!(out.agreed_weight24k, Some(dec!(5.0000)));
        assert_eq!(out.agreed_price, Some(dec!(300)));
    }

    #[test]
    fn normalize_strips_branch_foreign_fields() {
        let mut cash = TransactionLine::new(LineType::Cash, Direction::In);
        cash.product = Some(gold_snapshot());
        cash.quantity = Some(2);
        cash.weight_brut = Some(dec!(1));
        cash.carat = Some(Carat::K22);
        cash.agreed_milliemes = Some(916);
        cash.agreed_price = Some(dec!(99));
        cash.amount = Some(dec!(100));
        cash.status = Some(FulfillmentStatus::HandedOut);

        let out = normalize(&cash, DocumentKind::Scenario, dec!(50));
        assert_eq!(out.product, None);
        assert_eq!(out.quantity, None);
        assert_eq!(out.weight_brut, None);
        assert_eq!(out.carat, None);
        assert_eq!(out.agreed_milliemes, None);
        assert_eq!(out.agreed_price, None);
        assert_eq!(out.status, None);
        assert_eq!(out.amount, Some(dec!(100)));
        assert_eq!(out.agreed_weight24k, Some(dec!(2.0000)));
    }

    #[test]
    fn normalize_keeps_status_only_on_outgoing_order_products() {
        let mut line = gold_line(dec!(10), Carat::K22, 1);
        line.direction = Direction::Out;
        line.agreed_milliemes = Some(916);
        line.status = Some(FulfillmentStatus::ToBeOrdered);

        let in_order = normalize(&line, DocumentKind::Order, dec!(60));
        assert_eq!(
            in_order.status,
            Some(FulfillmentStatus::ToBeOrdered)
        );

        let in_supply = normalize(&line, DocumentKind::Supply, dec!(60));
        assert_eq!(in_supply.status, None);

        let mut incoming = line.clone();
        incoming.direction = Direction::In;
        let incoming_in_order = normalize(&incoming, DocumentKind::Order, dec!(60));
        assert_eq!(incoming_in_order.status, None);
    }
}
