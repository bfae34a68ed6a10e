//! Row store: the single source of truth for displayed annotation data.
//!
//! All mutation funnels through [`RowStore::write`], which keeps the row
//! fields, the diff baselines, the edit history, the cached per-row counts
//! and the aggregate counters consistent within one call; subscribers never
//! observe a partially applied write. The store is not reentrant-safe
//! against concurrent writers; the presentation layer serializes edits.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::diff;
use crate::events::{CallbackRegistry, EventCallback, StoreEvent, SubscriptionId};
use crate::history::{EditInfo, EditTracker, EditedCount};
use crate::row::{
    normalize_whitespace, CellValue, Column, Row, RowId, TextColumn, SOUND_QUALITY_MAX,
    SOUND_QUALITY_MIN,
};
use crate::wordcount::WordCounts;

/// Immutable per-row snapshot of the three text fields as first imported.
///
/// Used solely as the diff baseline; set once at import time (left empty for
/// rows created by insertion) and never mutated afterward.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Original transcript text.
    pub transcript: String,
    /// Original mispronunciation notes.
    pub mispronounced: String,
    /// Original tag list.
    pub tags: String,
}

impl Baseline {
    /// Baseline text of an editable text column.
    pub fn text(&self, column: TextColumn) -> &str {
        match column {
            TextColumn::Transcript => &self.transcript,
            TextColumn::Mispronounced => &self.mispronounced,
            TextColumn::Tags => &self.tags,
        }
    }
}

/// In-memory ordered collection of annotation rows with edit tracking.
#[derive(Debug, Default)]
pub struct RowStore {
    rows: Vec<Row>,
    /// Stable identity per row, parallel to `rows`.
    ids: Vec<RowId>,
    next_id: u64,
    baselines: HashMap<RowId, Baseline>,
    /// Cells carrying the edited highlight marker. The marker is opaque to
    /// the core; the view decides how to render it.
    highlights: HashSet<(RowId, TextColumn)>,
    tracker: EditTracker,
    counts: WordCounts,
    registry: CallbackRegistry,
}

impl RowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> RowId {
        self.next_id += 1;
        RowId(self.next_id)
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    /// Append a row; returns its index. The index is stable until a removal
    /// above it occurs.
    ///
    /// The row gets no diff baseline; use [`import_row`](Self::import_row)
    /// for rows loaded from a transcript document.
    pub fn add_row(&mut self, row: Row) -> usize {
        let id = self.alloc_id();
        self.ids.push(id);
        self.rows.push(row);
        let index = self.rows.len() - 1;
        self.registry.emit(&StoreEvent::RowInserted { row: index });
        index
    }

    /// Append a row loaded from a transcript document: snapshot its text
    /// fields as the diff baseline and apply imported edited flags as
    /// highlight markers only, without touching the edited aggregates.
    pub fn import_row(&mut self, row: Row) -> usize {
        let id = self.alloc_id();
        self.ids.push(id);
        self.baselines.insert(
            id,
            Baseline {
                transcript: row.transcript.clone(),
                mispronounced: row.mispronounced.clone(),
                tags: row.tags.clone(),
            },
        );
        for column in TextColumn::ALL {
            if row.edited(column) {
                self.highlights.insert((id, column));
            }
        }
        self.rows.push(row);
        let index = self.rows.len() - 1;
        self.registry.emit(&StoreEvent::RowInserted { row: index });
        index
    }

    /// Insert a blank row at `at`, shifting subsequent indices up by one.
    /// An out-of-range position appends instead.
    pub fn insert_row(&mut self, at: usize) {
        let at = at.min(self.rows.len());
        let id = self.alloc_id();
        self.ids.insert(at, id);
        self.rows.insert(at, Row::default());
        self.registry.emit(&StoreEvent::RowInserted { row: at });
    }

    /// Remove the row at `at`, shifting subsequent indices down by one.
    /// A no-op if `at` is out of bounds.
    ///
    /// Side tables are keyed by the row's stable id, so the remaining rows
    /// keep their baselines and history untouched. The removed row's edit
    /// history is retained for audit; its cached counts are dropped.
    pub fn remove_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            log::debug!("remove_row({at}) ignored: only {} rows", self.rows.len());
            return;
        }
        let id = self.ids.remove(at);
        self.rows.remove(at);
        self.baselines.remove(&id);
        self.highlights.retain(|(row_id, _)| *row_id != id);
        self.tracker.forget_row(id);
        self.registry.emit(&StoreEvent::RowRemoved { row: at });
    }

    /// Empty rows, baselines, history, highlight markers and cached per-row
    /// counts. The aggregate counters are left to the caller, which resets
    /// them when a new transcript is opened.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.ids.clear();
        self.baselines.clear();
        self.highlights.clear();
        self.tracker.clear();
        self.registry.emit(&StoreEvent::Cleared);
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// The single mutation entry point.
    ///
    /// Text columns run the full diff pipeline: the value is whitespace
    /// normalized, compared against the row's baseline, the edited flag and
    /// highlight marker updated, the cached magnitude and the aggregate
    /// counter moved by delta, and an edit-history record appended. Reverts
    /// (value equal to the baseline) clear the flag and emit the negative of
    /// the previously cached magnitude.
    ///
    /// Quality columns clamp and store the value directly with no diff or
    /// history side effects; the audio column stores the text as-is.
    ///
    /// Returns `false` without touching anything when the row is out of
    /// bounds or the value kind does not match the column.
    pub fn write(&mut self, row: usize, column: Column, value: CellValue) -> bool {
        if row >= self.rows.len() {
            log::warn!("write to row {row} ignored: only {} rows", self.rows.len());
            return false;
        }

        match column {
            Column::Transcript | Column::Mispronounced | Column::Tags => {
                let text_column = match column.as_text() {
                    Some(c) => c,
                    None => return false,
                };
                let CellValue::Text(text) = value else {
                    log::warn!("non-text value written to {column:?} ignored");
                    return false;
                };
                self.write_text(row, text_column, &text);
            }
            Column::Audio => {
                let CellValue::Text(text) = value else {
                    log::warn!("non-text value written to audio column ignored");
                    return false;
                };
                self.rows[row].audio_file = normalize_whitespace(&text);
                self.registry.emit(&StoreEvent::CellChanged { row, column });
            }
            Column::SoundQuality => {
                let CellValue::Number(n) = value else {
                    log::warn!("non-numeric value written to sound quality ignored");
                    return false;
                };
                self.rows[row].sound_quality = n.clamp(SOUND_QUALITY_MIN, SOUND_QUALITY_MAX) as u8;
                self.registry.emit(&StoreEvent::CellChanged { row, column });
            }
            Column::AsrQuality => {
                let CellValue::Number(n) = value else {
                    log::warn!("non-numeric value written to ASR quality ignored");
                    return false;
                };
                self.rows[row].asr_quality = n.clamp(0, 1) as u8;
                self.registry.emit(&StoreEvent::CellChanged { row, column });
            }
        }
        true
    }

    fn write_text(&mut self, row: usize, column: TextColumn, raw: &str) {
        let value = normalize_whitespace(raw);
        let id = self.ids[row];
        let baseline = self
            .baselines
            .get(&id)
            .map(|b| b.text(column).to_string())
            .unwrap_or_default();
        let reverted = value == baseline;

        let delta: i64 = if reverted {
            self.highlights.remove(&(id, column));
            self.rows[row].set_edited(column, false);
            let previous = self.tracker.cached(id, column);
            self.tracker.set_cached(id, column, 0);
            if previous > 0 { -(previous as i64) } else { 0 }
        } else {
            let magnitude = diff::edit_magnitude(&value, &baseline, column.delimiter());
            self.highlights.insert((id, column));
            self.rows[row].set_edited(column, true);
            let previous = self.tracker.cached(id, column);
            if magnitude != previous {
                self.tracker.set_cached(id, column, magnitude);
                magnitude as i64 - previous as i64
            } else {
                0
            }
        };

        self.rows[row].set_text(column, value.clone());
        self.tracker.record_edit(id, column, &value, &baseline);
        if delta != 0 {
            self.counts.apply_delta(column, delta);
        }

        self.registry.emit(&StoreEvent::CellChanged {
            row,
            column: column.into(),
        });
        if delta != 0 {
            self.registry
                .emit(&StoreEvent::EditedWordsDelta { column, delta });
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Read-only ordered view of all rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Value of a cell, or `None` for an out-of-bounds row.
    pub fn cell(&self, row: usize, column: Column) -> Option<CellValue> {
        let row = self.rows.get(row)?;
        Some(match column {
            Column::Audio => CellValue::Text(row.audio_file.clone()),
            Column::Transcript => CellValue::Text(row.transcript.clone()),
            Column::Mispronounced => CellValue::Text(row.mispronounced.clone()),
            Column::Tags => CellValue::Text(row.tags.clone()),
            Column::SoundQuality => CellValue::Number(row.sound_quality as i64),
            Column::AsrQuality => CellValue::Number(row.asr_quality as i64),
        })
    }

    /// Whether a cell carries the edited highlight marker.
    pub fn is_highlighted(&self, row: usize, column: TextColumn) -> bool {
        self.ids
            .get(row)
            .map(|id| self.highlights.contains(&(*id, column)))
            .unwrap_or(false)
    }

    /// Baseline text of a cell, empty for rows without an import baseline.
    pub fn original_text(&self, row: usize, column: TextColumn) -> Option<String> {
        let id = self.ids.get(row)?;
        Some(
            self.baselines
                .get(id)
                .map(|b| b.text(column).to_string())
                .unwrap_or_default(),
        )
    }

    /// Whether writing `candidate` into the cell would restore its original
    /// text (after whitespace normalization).
    pub fn is_reverted(&self, row: usize, column: TextColumn, candidate: &str) -> bool {
        match self.original_text(row, column) {
            Some(baseline) => normalize_whitespace(candidate) == baseline,
            None => false,
        }
    }

    /// Ordered edit history of a cell, oldest first.
    pub fn history_of(&self, row: usize, column: TextColumn) -> &[EditInfo] {
        match self.ids.get(row) {
            Some(id) => self.tracker.history_of(*id, column),
            None => &[],
        }
    }

    /// Sum of active history word counts for `column` across all rows.
    pub fn total_active_words(&self, column: TextColumn) -> usize {
        self.tracker.total_active_words(column)
    }

    /// Cached current edit magnitudes of a row.
    pub fn edited_counts(&self, row: usize) -> EditedCount {
        self.ids
            .get(row)
            .map(|id| self.tracker.edited_counts(*id))
            .unwrap_or_default()
    }

    /// Re-derive the edited-word total of a whole column from scratch using
    /// token-level Levenshtein distance against each row's baseline.
    ///
    /// This is the slow reconciliation path; the write path maintains the
    /// aggregate counters incrementally instead.
    pub fn recompute_edited_words(&self, column: TextColumn) -> usize {
        self.ids
            .iter()
            .zip(&self.rows)
            .map(|(id, row)| {
                let baseline = self
                    .baselines
                    .get(id)
                    .map(|b| b.text(column))
                    .unwrap_or_default();
                diff::word_edit_distance(row.text(column), baseline, column.delimiter())
            })
            .sum()
    }

    // ------------------------------------------------------------------
    // Aggregates and notifications
    // ------------------------------------------------------------------

    /// Current model-wide word counters.
    pub fn word_counts(&self) -> WordCounts {
        self.counts
    }

    /// Replace the model-wide word counters, e.g. when resuming totals from
    /// a sidecar document.
    pub fn set_word_counts(&mut self, counts: WordCounts) {
        self.counts = counts;
    }

    /// Subscribe to store events; returns an id for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.registry.subscribe(callback)
    }

    /// Remove a subscription. Returns `true` if it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.registry.unsubscribe(id)
    }
}
