//! Annotator facade: ties the row store to the two on-disk documents.
//!
//! The presentation layer owns one `Annotator` per open transcript. Opening
//! decodes the transcript document into the store, snapshots baselines, and
//! resumes the cumulative word counters from the sidecar when one exists;
//! saving mirrors the store back out and writes the sidecar afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{self, DecodedTranscript};
use crate::error::{LekhaError, Result};
use crate::events::{EventCallback, SubscriptionId};
use crate::row::{CellValue, Column, Row};
use crate::store::RowStore;
use crate::wordcount::WordCounts;

/// Result of opening a transcript.
#[derive(Debug, Clone)]
pub struct OpenSummary {
    /// Number of rows loaded.
    pub rows: usize,
    /// Counters after resuming from the sidecar (or import totals with
    /// zeroed edited counts when no sidecar was found).
    pub counts: WordCounts,
    /// Non-fatal decode problems, for display as advisories.
    pub warnings: Vec<String>,
}

/// Result of a successful save, the data behind the post-save report.
#[derive(Debug, Clone)]
pub struct SaveSummary {
    /// Number of rows written.
    pub rows: usize,
    /// Counters as persisted to the sidecar.
    pub counts: WordCounts,
}

/// One open transcript: the row store plus its file binding.
#[derive(Debug, Default)]
pub struct Annotator {
    store: RowStore,
    path: Option<PathBuf>,
}

impl Annotator {
    /// Create an annotator with an empty store and no file binding.
    pub fn new() -> Self {
        Self::default()
    }

    /// The row store.
    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Mutable access to the row store.
    pub fn store_mut(&mut self) -> &mut RowStore {
        &mut self.store
    }

    /// Path of the currently open transcript, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Open a transcript document, replacing the store contents.
    ///
    /// On a read or decode failure the in-memory state is left unchanged.
    /// A present sidecar supersedes the six counters; otherwise the totals
    /// computed during the import are kept with zeroed edited counts.
    pub fn open(&mut self, path: &Path) -> Result<OpenSummary> {
        let xml = fs::read_to_string(path).map_err(|source| LekhaError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let DecodedTranscript {
            rows,
            totals,
            warnings,
        } = document::decode_transcript(&xml)?;

        self.store.clear();
        for row in rows {
            self.store.import_row(row);
        }

        let counts = WordCounts::load(path).unwrap_or(totals);
        self.store.set_word_counts(counts);
        self.path = Some(path.to_path_buf());

        log::info!(
            "opened '{}' with {} rows",
            path.display(),
            self.store.row_count()
        );
        Ok(OpenSummary {
            rows: self.store.row_count(),
            counts,
            warnings,
        })
    }

    /// Save to the path the transcript was opened from.
    pub fn save(&mut self) -> Result<SaveSummary> {
        let path = self.path.clone().ok_or(LekhaError::NoTranscriptPath)?;
        self.save_to(&path)
    }

    /// Save to an explicit path, which becomes the new file binding.
    pub fn save_as(&mut self, path: &Path) -> Result<SaveSummary> {
        self.save_to(path)
    }

    fn save_to(&mut self, path: &Path) -> Result<SaveSummary> {
        let xml = document::encode_transcript(self.store.rows())?;
        fs::write(path, xml).map_err(|source| LekhaError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        // The sidecar follows every successful transcript save
        let counts = self.store.word_counts();
        counts.save(path)?;
        self.path = Some(path.to_path_buf());

        log::info!(
            "saved '{}' with {} rows",
            path.display(),
            self.store.row_count()
        );
        Ok(SaveSummary {
            rows: self.store.row_count(),
            counts,
        })
    }

    // Collaborator passthroughs, so a UI layer can hold just the Annotator.

    /// See [`RowStore::write`].
    pub fn write(&mut self, row: usize, column: Column, value: CellValue) -> bool {
        self.store.write(row, column, value)
    }

    /// See [`RowStore::add_row`].
    pub fn add_row(&mut self, row: Row) -> usize {
        self.store.add_row(row)
    }

    /// See [`RowStore::insert_row`].
    pub fn insert_row(&mut self, at: usize) {
        self.store.insert_row(at);
    }

    /// See [`RowStore::remove_row`].
    pub fn remove_row(&mut self, at: usize) {
        self.store.remove_row(at);
    }

    /// See [`RowStore::clear`].
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// See [`RowStore::subscribe`].
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.store.subscribe(callback)
    }

    /// See [`RowStore::unsubscribe`].
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }
}
