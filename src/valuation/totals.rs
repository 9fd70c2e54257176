//! Document summary totals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{round_money, round_weight, Direction, LineType, TransactionLine};

/// Summary accumulators for one document.
///
/// Totals are never mutated in place. [`DocumentTotals::aggregate`] rebuilds
/// them from zero on every change to the line list, which is what makes
/// re-running the fold idempotent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTotals {
    pub total24k_product_in: Decimal,
    pub total24k_product_out: Decimal,
    pub total24k_scrap_in: Decimal,
    pub total24k_scrap_out: Decimal,
    pub total24k_in: Decimal,
    pub total24k_out: Decimal,
    /// Signed monetary balance of the gold lines: incoming prices add,
    /// outgoing prices subtract.
    pub total24k: Decimal,
    pub total_cash_in: Decimal,
    pub total_cash_out: Decimal,
    pub total_bank_in: Decimal,
    pub total_bank_out: Decimal,
    pub total_money_in: Decimal,
    pub total_money_out: Decimal,
    pub total_money: Decimal,
}

impl DocumentTotals {
    /// Fold the full line list once into fresh accumulators.
    ///
    /// Outgoing scrap increments `total24k_out` exactly like outgoing
    /// product; no line type gets an inverted sign.
    pub fn aggregate(lines: &[TransactionLine]) -> Self {
        let mut totals = DocumentTotals::default();
        for line in lines {
            let weight = line.agreed_weight24k.unwrap_or_default();
            let price = line.agreed_price.unwrap_or_default();
            let amount = line.amount.unwrap_or_default();
            match (line.line_type, line.direction) {
                (LineType::Product, Direction::In) => {
                    totals.total24k_product_in += weight;
                    totals.total24k_in += weight;
                    totals.total24k += price;
                }
                (LineType::Product, Direction::Out) => {
                    totals.total24k_product_out += weight;
                    totals.total24k_out += weight;
                    totals.total24k -= price;
                }
                (LineType::Scrap, Direction::In) => {
                    totals.total24k_scrap_in += weight;
                    totals.total24k_in += weight;
                    totals.total24k += price;
                }
                (LineType::Scrap, Direction::Out) => {
                    totals.total24k_scrap_out += weight;
                    totals.total24k_out += weight;
                    totals.total24k -= price;
                }
                (LineType::Cash, Direction::In) => {
                    totals.total_cash_in += amount;
                    totals.total_money_in += amount;
                    totals.total_money += amount;
                }
                (LineType::Cash, Direction::Out) => {
                    totals.total_cash_out += amount;
                    totals.total_money_out += amount;
                    totals.total_money -= amount;
                }
                (LineType::Bank, Direction::In) => {
                    totals.total_bank_in += amount;
                    totals.total_money_in += amount;
                    totals.total_money += amount;
                }
                (LineType::Bank, Direction::Out) => {
                    totals.total_bank_out += amount;
                    totals.total_money_out += amount;
                    totals.total_money -= amount;
                }
                (LineType::Money, Direction::In) => {
                    totals.total_money_in += amount;
                    totals.total_money += amount;
                }
                (LineType::Money, Direction::Out) => {
                    totals.total_money_out += amount;
                    totals.total_money -= amount;
                }
            }
        }
        totals.rounded()
    }

    fn rounded(self) -> Self {
        Self {
            total24k_product_in: round_weight(self.total24k_product_in),
            total24k_product_out: round_weight(self.total24k_product_out),
            total24k_scrap_in: round_weight(self.total24k_scrap_in),
            total24k_scrap_out: round_weight(self.total24k_scrap_out),
            total24k_in: round_weight(self.total24k_in),
            total24k_out: round_weight(self.total24k_out),
            total24k: round_money(self.total24k),
            total_cash_in: round_money(self.total_cash_in),
            total_cash_out: round_money(self.total_cash_out),
            total_bank_in: round_money(self.total_bank_in),
            total_bank_out: round_money(self.total_bank_out),
            total_money_in: round_money(self.total_money_in),
            total_money_out: round_money(self.total_money_out),
            total_money: round_money(self.total_money),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::{recalculate, Carat, LineEdit, ProductSnapshot};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn cash(direction: Direction, amount: Decimal) -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Cash, direction);
        line.amount = Some(amount);
        line.agreed_weight24k = Some(dec!(0));
        line
    }

    fn bank(direction: Direction, amount: Decimal) -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Bank, direction);
        line.amount = Some(amount);
        line.agreed_weight24k = Some(dec!(0));
        line
    }

    fn gold_product(direction: Direction, brut: Decimal, milliemes: i32) -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Product, direction);
        line.product = Some(ProductSnapshot {
            id: Uuid::new_v4(),
            is_gold: true,
            contains_gold: false,
            carat: None,
            weight_brut: None,
        });
        line.weight_brut = Some(brut);
        line.carat = Some(Carat::K22);
        line.quantity = Some(1);
        recalculate(&line, dec!(60), &LineEdit::Milliemes { milliemes })
    }

    fn scrap(direction: Direction, brut: Decimal, milliemes: i32) -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Scrap, direction);
        line.weight_brut = Some(brut);
        line.carat = Some(Carat::K22);
        recalculate(&line, dec!(60), &LineEdit::Milliemes { milliemes })
    }

    #[test]
    fn money_lines_split_and_combine() {
        let lines = vec![cash(Direction::In, dec!(100)), bank(Direction::Out, dec!(40))];
        let totals = DocumentTotals::aggregate(&lines);
        assert_eq!(totals.total_cash_in, dec!(100.00));
        assert_eq!(totals.total_cash_out, dec!(0.00));
        assert_eq!(totals.total_bank_out, dec!(40.00));
        assert_eq!(totals.total_money_in, dec!(100.00));
        assert_eq!(totals.total_money_out, dec!(40.00));
        assert_eq!(totals.total_money, dec!(60.00));
    }

    #[test]
    fn gold_lines_split_by_type_and_direction() {
        let lines = vec![
            gold_product(Direction::In, dec!(10), 900),
            scrap(Direction::Out, dec!(4), 750),
        ];
        let totals = DocumentTotals::aggregate(&lines);
        assert_eq!(totals.total24k_product_in, dec!(9.0000));
        assert_eq!(totals.total24k_scrap_out, dec!(3.0000));
        assert_eq!(totals.total24k_in, dec!(9.0000));
        assert_eq!(totals.total24k_out, dec!(3.0000));
        // 540.00 in minus 180.00 out.
        assert_eq!(totals.total24k, dec!(360.00));
    }

    #[test]
    fn scrap_out_adds_to_the_outbound_total() {
        let lines = vec![
            gold_product(Direction::Out, dec!(10), 900),
            scrap(Direction::Out, dec!(4), 750),
        ];
        let totals = DocumentTotals::aggregate(&lines);
        assert_eq!(totals.total24k_out, dec!(12.0000));
        assert_eq!(totals.total24k_scrap_out, dec!(3.0000));
        assert_eq!(totals.total24k_product_out, dec!(9.0000));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let lines = vec![
            gold_product(Direction::In, dec!(10), 916),
            scrap(Direction::In, dec!(2.5), 800),
            cash(Direction::Out, dec!(75.50)),
        ];
        let first = DocumentTotals::aggregate(&lines);
        let second = DocumentTotals::aggregate(&lines);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_document_aggregates_to_zero() {
        let totals = DocumentTotals::aggregate(&[]);
        assert_eq!(totals, DocumentTotals::default());
    }

    #[test]
    fn totals_are_stable_across_repeated_saves() {
        // Recomputing from already-rounded line fields must not drift.
        let lines: Vec<TransactionLine> = vec![
            gold_product(Direction::In, dec!(3.333), 917),
            gold_product(Direction::Out, dec!(1.111), 583),
            scrap(Direction::In, dec!(0.007), 999),
        ];
        let first = DocumentTotals::aggregate(&lines);
        let relines: Vec<TransactionLine> = lines
            .iter()
            .map(|line| recalculate(line, dec!(60), &LineEdit::RateApplied))
            .collect();
        let second = DocumentTotals::aggregate(&relines);
        assert_eq!(first, second);
    }
}
