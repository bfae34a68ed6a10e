//! Per-cell edit history and cached edited-word counts.
//!
//! The tracker owns two side tables keyed by stable row identity:
//!
//! - an append-only [`EditInfo`] history per (row, text column), sized with
//!   the symmetric word difference against the baseline;
//! - an [`EditedCount`] cache of each row's current heuristic edit
//!   magnitude, which lets the write path report aggregate changes as O(1)
//!   deltas instead of recomputing column totals on every keystroke.
//!
//! The two tables intentionally measure "words changed" differently; see
//! [`crate::diff`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::diff;
use crate::row::{RowId, TextColumn};

/// One record per edit event on a given (row, column) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditInfo {
    /// The cell text resulting from the edit.
    pub text: String,
    /// Symmetric word difference against the baseline at edit time.
    pub word_count: usize,
    /// False once a later edit restored the cell to its original text.
    /// Inactive records are retained for audit history but excluded from
    /// active totals.
    pub active: bool,
}

/// Per-row cache of the current heuristic edit magnitude for each editable
/// text column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditedCount {
    /// Edited-word magnitude of the transcript cell.
    pub transcript: usize,
    /// Edited-word magnitude of the mispronunciation cell.
    pub mispronounced: usize,
    /// Edited-word magnitude of the tags cell.
    pub tagged: usize,
}

impl EditedCount {
    fn get(&self, column: TextColumn) -> usize {
        match column {
            TextColumn::Transcript => self.transcript,
            TextColumn::Mispronounced => self.mispronounced,
            TextColumn::Tags => self.tagged,
        }
    }

    fn set(&mut self, column: TextColumn, value: usize) {
        match column {
            TextColumn::Transcript => self.transcript = value,
            TextColumn::Mispronounced => self.mispronounced = value,
            TextColumn::Tags => self.tagged = value,
        }
    }
}

/// Edit history map and edited-count cache for a row store.
#[derive(Debug, Default)]
pub struct EditTracker {
    /// Append-only history per cell, in first-edit order.
    history: IndexMap<(RowId, TextColumn), Vec<EditInfo>>,
    /// Cached current magnitudes per row.
    cached: HashMap<RowId, EditedCount>,
}

impl EditTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordered edit history of a cell, oldest first. Empty if the cell was
    /// never edited.
    pub fn history_of(&self, id: RowId, column: TextColumn) -> &[EditInfo] {
        self.history
            .get(&(id, column))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Sum of active record word counts for `column` across all rows.
    ///
    /// This is the reconciliation path, independent of the incremental
    /// cache; it walks the full history rather than the cached magnitudes.
    pub fn total_active_words(&self, column: TextColumn) -> usize {
        self.history
            .iter()
            .filter(|((_, col), _)| *col == column)
            .flat_map(|(_, records)| records.iter())
            .filter(|record| record.active)
            .map(|record| record.word_count)
            .sum()
    }

    /// Append a history record for an edit of `new_text` against `baseline`.
    ///
    /// A revert (new text equal to the baseline) first marks every prior
    /// record for the cell inactive; the appended record then carries a zero
    /// word count.
    pub(crate) fn record_edit(
        &mut self,
        id: RowId,
        column: TextColumn,
        new_text: &str,
        baseline: &str,
    ) {
        let word_count = diff::symmetric_word_difference(new_text, baseline, column.delimiter());
        let records = self.history.entry((id, column)).or_default();

        if new_text == baseline {
            for record in records.iter_mut() {
                record.active = false;
            }
        }

        records.push(EditInfo {
            text: new_text.to_string(),
            word_count,
            active: true,
        });
    }

    /// Cached current magnitude for a cell (0 if never edited).
    pub(crate) fn cached(&self, id: RowId, column: TextColumn) -> usize {
        self.cached.get(&id).map(|c| c.get(column)).unwrap_or(0)
    }

    pub(crate) fn set_cached(&mut self, id: RowId, column: TextColumn, value: usize) {
        self.cached.entry(id).or_default().set(column, value);
    }

    /// Cached magnitudes of one row.
    pub fn edited_counts(&self, id: RowId) -> EditedCount {
        self.cached.get(&id).copied().unwrap_or_default()
    }

    /// Drop the cached counts of a removed row.
    ///
    /// History records for the row are retained for audit until a full
    /// [`clear`](Self::clear).
    pub(crate) fn forget_row(&mut self, id: RowId) {
        self.cached.remove(&id);
    }

    /// Drop all history and cached counts.
    pub(crate) fn clear(&mut self) {
        self.history.clear();
        self.cached.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> RowId {
        RowId(n)
    }

    #[test]
    fn test_record_and_history() {
        let mut tracker = EditTracker::new();
        tracker.record_edit(id(1), TextColumn::Transcript, "the quick brown fox", "the quick fox");

        let history = tracker.history_of(id(1), TextColumn::Transcript);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].word_count, 1);
        assert!(history[0].active);
        assert!(tracker.history_of(id(2), TextColumn::Transcript).is_empty());
    }

    #[test]
    fn test_revert_deactivates_prior_records() {
        let mut tracker = EditTracker::new();
        tracker.record_edit(id(1), TextColumn::Tags, "noise;music", "noise");
        tracker.record_edit(id(1), TextColumn::Tags, "noise;music;hum", "noise");
        tracker.record_edit(id(1), TextColumn::Tags, "noise", "noise");

        let history = tracker.history_of(id(1), TextColumn::Tags);
        assert_eq!(history.len(), 3);
        assert!(!history[0].active);
        assert!(!history[1].active);
        assert!(history[2].active);
        assert_eq!(history[2].word_count, 0);
        assert_eq!(tracker.total_active_words(TextColumn::Tags), 0);
    }

    #[test]
    fn test_total_active_words_spans_rows() {
        let mut tracker = EditTracker::new();
        tracker.record_edit(id(1), TextColumn::Transcript, "a b x", "a b");
        tracker.record_edit(id(2), TextColumn::Transcript, "p q", "p");
        tracker.record_edit(id(2), TextColumn::Tags, "t;u", "t");

        assert_eq!(tracker.total_active_words(TextColumn::Transcript), 2);
        assert_eq!(tracker.total_active_words(TextColumn::Tags), 1);
        assert_eq!(tracker.total_active_words(TextColumn::Mispronounced), 0);
    }

    #[test]
    fn test_cached_counts() {
        let mut tracker = EditTracker::new();
        assert_eq!(tracker.cached(id(1), TextColumn::Transcript), 0);

        tracker.set_cached(id(1), TextColumn::Transcript, 4);
        tracker.set_cached(id(1), TextColumn::Tags, 2);
        assert_eq!(tracker.cached(id(1), TextColumn::Transcript), 4);
        assert_eq!(tracker.edited_counts(id(1)).tagged, 2);

        tracker.forget_row(id(1));
        assert_eq!(tracker.cached(id(1), TextColumn::Transcript), 0);
    }

    #[test]
    fn test_clear() {
        let mut tracker = EditTracker::new();
        tracker.record_edit(id(1), TextColumn::Transcript, "x", "");
        tracker.set_cached(id(1), TextColumn::Transcript, 1);

        tracker.clear();
        assert!(tracker.history_of(id(1), TextColumn::Transcript).is_empty());
        assert_eq!(tracker.cached(id(1), TextColumn::Transcript), 0);
    }
}
