//! In-memory document editing.
//!
//! [`DocumentEditor`] owns one draft and keeps its derived fields consistent
//! after every mutation. Its lifecycle is deliberately small: a fresh editor
//! starts in [`EditorState::New`], a loaded one in [`EditorState::Editing`],
//! and a successful save always lands back in `Editing` with the echoed
//! document as the new dirty-tracking baseline.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::{
    diff::document_changed, recalc, totals::DocumentTotals, DocumentDraft, DocumentKind, LineEdit,
    TransactionLine,
};

/// Where the editor sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    /// Fresh document, nothing persisted yet.
    New,
    /// Editing a document that exists in the store.
    Editing,
}

/// Errors from editor mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditorError {
    #[error("no transaction line at position {0}")]
    LineOutOfRange(usize),
}

/// What a save submits: the normalized document plus its recomputed totals.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub document: DocumentDraft,
    pub totals: DocumentTotals,
}

#[derive(Debug, Clone)]
pub struct DocumentEditor {
    state: EditorState,
    baseline: DocumentDraft,
    draft: DocumentDraft,
}

impl DocumentEditor {
    /// Start a new, empty document of the given kind at the given rate.
    pub fn begin(kind: DocumentKind, gold_rate: Decimal) -> Self {
        let draft = DocumentDraft::empty(kind, gold_rate);
        Self {
            state: EditorState::New,
            baseline: draft.clone(),
            draft,
        }
    }

    /// Open a stored document for editing.
    pub fn load(document: DocumentDraft) -> Self {
        Self {
            state: EditorState::Editing,
            baseline: document.clone(),
            draft: document,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn draft(&self) -> &DocumentDraft {
        &self.draft
    }

    /// Append a line, deriving its computed fields at the current rate.
    pub fn add_line(&mut self, line: TransactionLine) {
        let line = recalc::rederive(&line, self.draft.agreed_gold_rate);
        self.draft.lines.push(line);
    }

    /// Apply one edit to the line at `index` and recompute it.
    pub fn edit_line(&mut self, index: usize, edit: &LineEdit) -> Result<(), EditorError> {
        let rate = self.draft.agreed_gold_rate;
        let line = self
            .draft
            .lines
            .get_mut(index)
            .ok_or(EditorError::LineOutOfRange(index))?;
        *line = recalc::recalculate(line, rate, edit);
        Ok(())
    }

    pub fn remove_line(&mut self, index: usize) -> Result<TransactionLine, EditorError> {
        if index >= self.draft.lines.len() {
            return Err(EditorError::LineOutOfRange(index));
        }
        Ok(self.draft.lines.remove(index))
    }

    /// Move a line to a new position. Totals are order-insensitive but the
    /// stored document keeps user ordering.
    pub fn move_line(&mut self, from: usize, to: usize) -> Result<(), EditorError> {
        let len = self.draft.lines.len();
        if from >= len {
            return Err(EditorError::LineOutOfRange(from));
        }
        if to >= len {
            return Err(EditorError::LineOutOfRange(to));
        }
        let line = self.draft.lines.remove(from);
        self.draft.lines.insert(to, line);
        Ok(())
    }

    /// Change the agreed rate and revalue every line against it.
    pub fn set_gold_rate(&mut self, rate: Decimal) {
        self.draft.agreed_gold_rate = rate;
        for line in &mut self.draft.lines {
            *line = recalc::rederive(line, rate);
        }
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.draft.description = description;
    }

    pub fn set_wholesaler(&mut self, wholesaler_id: Option<Uuid>) {
        self.draft.wholesaler_id = wholesaler_id;
    }

    pub fn set_document_date(&mut self, date: DateTime<Utc>) {
        self.draft.document_date = date;
    }

    /// True when a save would actually change the stored document.
    pub fn is_dirty(&self) -> bool {
        document_changed(&self.baseline, &self.draft)
    }

    /// Build the payload a save submits: lines normalized, totals rebuilt.
    pub fn submission(&self) -> Submission {
        let mut document = self.draft.clone();
        document.lines = document
            .lines
            .iter()
            .map(|line| recalc::normalize(line, document.kind, document.agreed_gold_rate))
            .collect();
        let totals = DocumentTotals::aggregate(&document.lines);
        Submission { document, totals }
    }

    /// Record a successful save. The echoed document becomes the baseline and
    /// the editor is (or stays) in `Editing`.
    pub fn mark_saved(&mut self, echo: DocumentDraft) {
        self.baseline = echo.clone();
        self.draft = echo;
        self.state = EditorState::Editing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::{Carat, Direction, LineType, ProductSnapshot};
    use rust_decimal_macros::dec;

    fn scrap_line() -> TransactionLine {
        let mut line = TransactionLine::new(LineType::Scrap, Direction::In);
        line.weight_brut = Some(dec!(5));
        line.carat = Some(Carat::K18);
        line.agreed_milliemes = Some(750);
        line
    }

    #[test]
    fn new_editor_is_clean_until_touched() {
        let mut editor = DocumentEditor::begin(DocumentKind::Scenario, dec!(60));
        assert_eq!(editor.state(), EditorState::New);
        assert!(!editor.is_dirty());

        editor.add_line(scrap_line());
        assert!(editor.is_dirty());
    }

    #[test]
    fn first_save_moves_new_to_editing() {
        let mut editor = DocumentEditor::begin(DocumentKind::Order, dec!(60));
        editor.add_line(scrap_line());
        let submission = editor.submission();
        editor.mark_saved(submission.document);
        assert_eq!(editor.state(), EditorState::Editing);
        assert!(!editor.is_dirty());
    }

    #[test]
    fn loaded_editor_tracks_changes_against_the_stored_copy() {
        let mut draft = DocumentDraft::empty(DocumentKind::Supply, dec!(60));
        draft.description = Some("restock".into());
        let mut editor = DocumentEditor::load(draft);
        assert_eq!(editor.state(), EditorState::Editing);
        assert!(!editor.is_dirty());

        editor.set_description(Some("restock, revised".into()));
        assert!(editor.is_dirty());

        editor.set_description(Some("restock".into()));
        assert!(!editor.is_dirty());
    }

    #[test]
    fn rate_change_revalues_every_line() {
        let mut editor = DocumentEditor::begin(DocumentKind::Scenario, dec!(60));
        editor.add_line(scrap_line());
        editor.set_gold_rate(dec!(80));
        let line = &editor.draft().lines[0];
        assert_eq!(line.agreed_weight24k, Some(dec!(3.7500)));
        assert_eq!(line.agreed_price, Some(dec!(300.00)));
    }

    #[test]
    fn line_edits_go_through_the_reducer() {
        let mut editor = DocumentEditor::begin(DocumentKind::Scenario, dec!(60));
        editor.add_line(scrap_line());
        editor
            .edit_line(0, &LineEdit::Milliemes { milliemes: 900 })
            .unwrap();
        assert_eq!(editor.draft().lines[0].agreed_weight24k, Some(dec!(4.5000)));

        let err = editor
            .edit_line(5, &LineEdit::Milliemes { milliemes: 900 })
            .unwrap_err();
        assert_eq!(err, EditorError::LineOutOfRange(5));
    }

    #[test]
    fn move_line_keeps_ordering_and_bounds() {
        let mut editor = DocumentEditor::begin(DocumentKind::Scenario, dec!(60));
        let mut cash = TransactionLine::new(LineType::Cash, Direction::In);
        cash.amount = Some(dec!(10));
        editor.add_line(scrap_line());
        editor.add_line(cash);
        editor.move_line(1, 0).unwrap();
        assert_eq!(editor.draft().lines[0].line_type, LineType::Cash);
        assert!(editor.move_line(0, 9).is_err());
    }

    #[test]
    fn submission_normalizes_lines_and_rebuilds_totals() {
        let mut editor = DocumentEditor::begin(DocumentKind::Scenario, dec!(50));
        let mut cash = TransactionLine::new(LineType::Cash, Direction::In);
        cash.amount = Some(dec!(100));
        cash.quantity = Some(3);
        cash.product = Some(ProductSnapshot {
            id: uuid::Uuid::new_v4(),
            is_gold: true,
            contains_gold: false,
            carat: None,
            weight_brut: None,
        });
        editor.add_line(cash);

        let submission = editor.submission();
        let line = &submission.document.lines[0];
        assert_eq!(line.product, None);
        assert_eq!(line.quantity, None);
        assert_eq!(line.agreed_weight24k, Some(dec!(2.0000)));
        assert_eq!(submission.totals.total_cash_in, dec!(100.00));
        assert_eq!(submission.totals.total_money, dec!(100.00));
    }
}
