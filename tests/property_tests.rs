//! Property-based tests for the valuation arithmetic.
//!
//! The recalculation and aggregation code is pure, so it gets hammered with
//! generated inputs: arbitrary half-filled lines, every carat tier, rates and
//! weights at their storage precision. The invariants here are the ones the
//! rest of the system silently relies on.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use aurum_api::valuation::{
    normalize, recalculate, rederive, round_money, round_weight, Carat, Direction, DocumentKind,
    DocumentTotals, FulfillmentStatus, LineEdit, LineType, ProductSnapshot, TransactionLine,
};

/// Monetary values at their 2dp storage precision.
fn money_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Weights at their 4dp storage precision.
fn weight_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=5_000_000).prop_map(|tenths_of_mg| Decimal::new(tenths_of_mg, 4))
}

/// Strictly positive rates, the only ones a document can carry.
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=20_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn carat_strategy() -> impl Strategy<Value = Carat> {
    prop::sample::select(vec![
        Carat::K24,
        Carat::K22,
        Carat::K21,
        Carat::K20,
        Carat::K18,
        Carat::K16,
        Carat::K14,
        Carat::K12,
        Carat::K10,
        Carat::K8,
    ])
}

fn line_type_strategy() -> impl Strategy<Value = LineType> {
    prop::sample::select(vec![
        LineType::Product,
        LineType::Scrap,
        LineType::Cash,
        LineType::Bank,
        LineType::Money,
    ])
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::In), Just(Direction::Out)]
}

fn kind_strategy() -> impl Strategy<Value = DocumentKind> {
    prop_oneof![
        Just(DocumentKind::Scenario),
        Just(DocumentKind::Order),
        Just(DocumentKind::Supply),
    ]
}

fn status_strategy() -> impl Strategy<Value = FulfillmentStatus> {
    prop::sample::select(vec![
        FulfillmentStatus::ToBeOrdered,
        FulfillmentStatus::AwaitingWholesaler,
        FulfillmentStatus::AwaitingCustomer,
        FulfillmentStatus::HandedOut,
    ])
}

/// A line as a client might submit it: any combination of fields filled,
/// whether or not they belong to the line's formula branch.
fn line_strategy() -> impl Strategy<Value = TransactionLine> {
    (
        (
            line_type_strategy(),
            direction_strategy(),
            prop::option::of(weight_strategy()),
            prop::option::of(carat_strategy()),
            prop::option::of(0i32..=1000),
        ),
        (
            prop::option::of(1i32..=20),
            prop::option::of(money_strategy()),
            prop::option::of(money_strategy()),
            prop::option::of(status_strategy()),
            any::<bool>(),
            any::<bool>(),
        ),
    )
        .prop_map(
            |(
                (line_type, direction, weight_brut, carat, agreed_milliemes),
                (quantity, agreed_price, amount, status, has_product, product_is_gold),
            )| {
                let mut line = TransactionLine::new(line_type, direction);
                line.weight_brut = weight_brut;
                line.carat = carat;
                line.agreed_milliemes = agreed_milliemes;
                line.quantity = quantity;
                line.agreed_price = agreed_price;
                line.amount = amount;
                line.status = status;
                if has_product {
                    line.product = Some(ProductSnapshot {
                        id: Uuid::new_v4(),
                        is_gold: product_is_gold,
                        contains_gold: false,
                        carat: None,
                        weight_brut: None,
                    });
                }
                line
            },
        )
}

fn gold_line_strategy() -> impl Strategy<Value = TransactionLine> {
    (
        direction_strategy(),
        weight_strategy(),
        carat_strategy(),
        0i32..=1000,
        1i32..=20,
    )
        .prop_map(|(direction, brut, carat, milliemes, quantity)| {
            let mut line = TransactionLine::new(LineType::Product, direction);
            line.product = Some(ProductSnapshot {
                id: Uuid::new_v4(),
                is_gold: true,
                contains_gold: false,
                carat: None,
                weight_brut: None,
            });
            line.weight_brut = Some(brut);
            line.carat = Some(carat);
            line.agreed_milliemes = Some(milliemes);
            line.quantity = Some(quantity);
            line
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn normalize_is_idempotent(
        line in line_strategy(),
        kind in kind_strategy(),
        rate in rate_strategy(),
    ) {
        let once = normalize(&line, kind, rate);
        let twice = normalize(&once, kind, rate);
        prop_assert_eq!(once, twice, "a second normalize pass changed the line");
    }

    #[test]
    fn purity_branch_keeps_price_and_weight_consistent(
        line in gold_line_strategy(),
        rate in rate_strategy(),
    ) {
        let out = recalculate(&line, rate, &LineEdit::RateApplied);

        let brut = line.weight_brut.unwrap();
        let quantity = Decimal::from(line.quantity.unwrap());
        let purity = line.carat.unwrap().purity();
        let milliemes = Decimal::from(line.agreed_milliemes.unwrap());

        prop_assert_eq!(
            out.weight24k,
            Some(round_weight(brut * purity * quantity)),
            "weight24k does not follow the catalog purity"
        );
        let agreed = round_weight(brut * milliemes / Decimal::from(1000) * quantity);
        prop_assert_eq!(out.agreed_weight24k, Some(agreed));
        prop_assert_eq!(
            out.agreed_price,
            Some(round_money(rate * agreed)),
            "agreed price is not the agreed weight at the document rate"
        );
    }

    #[test]
    fn price_edits_round_trip_through_the_agreed_weight(
        line in gold_line_strategy(),
        rate in rate_strategy(),
        price in money_strategy(),
    ) {
        let out = recalculate(&line, rate, &LineEdit::Price { price });
        prop_assert_eq!(out.agreed_price, Some(price), "a price edit must keep its price");
        prop_assert_eq!(
            out.agreed_weight24k,
            Some(round_weight(price / rate)),
            "agreed weight is not the price at the document rate"
        );
    }

    #[test]
    fn derived_fields_collapse_to_zero_instead_of_panicking(
        line in line_strategy(),
        amount in money_strategy(),
        price in money_strategy(),
    ) {
        // Zero rate: every division guard has to hold.
        let amount_edit = recalculate(&line, Decimal::ZERO, &LineEdit::Amount { amount });
        prop_assert!(amount_edit.agreed_weight24k.is_some());
        let price_edit = recalculate(&line, Decimal::ZERO, &LineEdit::Price { price });
        prop_assert!(price_edit.agreed_weight24k.is_some());

        if !line.is_gold() && line.line_type != LineType::Product {
            prop_assert_eq!(amount_edit.agreed_weight24k, Some(Decimal::ZERO));
        }
    }

    #[test]
    fn normalize_strips_fields_foreign_to_the_branch(
        line in line_strategy(),
        kind in kind_strategy(),
        rate in rate_strategy(),
    ) {
        let out = normalize(&line, kind, rate);
        match out.line_type {
            LineType::Product => {
                prop_assert_eq!(out.amount, None, "product lines carry no monetary amount");
                if !out.is_gold() {
                    prop_assert_eq!(out.weight_brut, None);
                    prop_assert_eq!(out.carat, None);
                    prop_assert_eq!(out.agreed_milliemes, None);
                    prop_assert_eq!(out.weight24k, None);
                }
            }
            LineType::Scrap => {
                prop_assert_eq!(out.amount, None);
                prop_assert!(out.product.is_none(), "scrap never references the catalog");
                prop_assert_eq!(out.quantity, None);
            }
            LineType::Cash | LineType::Bank | LineType::Money => {
                prop_assert!(out.product.is_none());
                prop_assert_eq!(out.quantity, None);
                prop_assert_eq!(out.weight_brut, None);
                prop_assert_eq!(out.carat, None);
                prop_assert_eq!(out.agreed_milliemes, None);
                prop_assert_eq!(out.weight24k, None);
                prop_assert_eq!(out.agreed_price, None);
                prop_assert_eq!(out.amount, line.amount, "the amount itself survives");
            }
        }

        let may_keep_status = kind == DocumentKind::Order
            && out.line_type == LineType::Product
            && out.direction == Direction::Out;
        if !may_keep_status {
            prop_assert_eq!(out.status, None, "status leaked outside outgoing order products");
        }
    }

    #[test]
    fn totals_decompose_by_type_and_direction(
        lines in prop::collection::vec(line_strategy(), 0..12),
        rate in rate_strategy(),
    ) {
        let normalized: Vec<TransactionLine> = lines
            .iter()
            .map(|line| normalize(line, DocumentKind::Scenario, rate))
            .collect();
        let totals = DocumentTotals::aggregate(&normalized);

        prop_assert_eq!(
            totals.total24k_in,
            totals.total24k_product_in + totals.total24k_scrap_in,
            "inbound weight must split exactly into product and scrap"
        );
        prop_assert_eq!(
            totals.total24k_out,
            totals.total24k_product_out + totals.total24k_scrap_out,
            "outbound weight must split exactly into product and scrap"
        );
        prop_assert_eq!(
            totals.total_money,
            totals.total_money_in - totals.total_money_out,
            "the money balance is the signed sum of the money flows"
        );

        let bare_money_in: Decimal = normalized
            .iter()
            .filter(|l| l.line_type == LineType::Money && l.direction == Direction::In)
            .map(|l| l.amount.unwrap_or_default())
            .sum();
        prop_assert_eq!(
            totals.total_money_in,
            totals.total_cash_in + totals.total_bank_in + bare_money_in,
            "money-in must be cash plus bank plus untyped money lines"
        );
    }

    #[test]
    fn aggregation_is_stable_across_saves(
        lines in prop::collection::vec(line_strategy(), 0..12),
        rate in rate_strategy(),
    ) {
        let normalized: Vec<TransactionLine> = lines
            .iter()
            .map(|line| normalize(line, DocumentKind::Supply, rate))
            .collect();
        let first = DocumentTotals::aggregate(&normalized);

        let resaved: Vec<TransactionLine> = normalized
            .iter()
            .map(|line| rederive(line, rate))
            .collect();
        let second = DocumentTotals::aggregate(&resaved);

        prop_assert_eq!(first, second, "re-deriving stored lines drifted the totals");
    }
}
