//! No-op save detection.

use super::{DocumentDraft, TransactionLine};

/// True when saving `after` would change anything the store keeps.
///
/// Totals are deliberately not compared: they are a pure function of the line
/// list and the rate, so comparing the inputs is sufficient.
pub fn document_changed(before: &DocumentDraft, after: &DocumentDraft) -> bool {
    before.description != after.description
        || before.wholesaler_id != after.wholesaler_id
        || before.document_date != after.document_date
        || before.agreed_gold_rate != after.agreed_gold_rate
        || lines_differ(&before.lines, &after.lines)
}

/// Position-sensitive, field-by-field comparison, so a pure reorder counts
/// as a change (stored documents keep user ordering).
fn lines_differ(before: &[TransactionLine], after: &[TransactionLine]) -> bool {
    before.len() != after.len() || before.iter().zip(after).any(|(a, b)| a != b)
}
