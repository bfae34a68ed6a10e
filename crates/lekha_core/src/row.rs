//! Annotation row and column types.
//!
//! A [`Row`] is one annotation unit: an audio reference plus the text and
//! quality fields the annotator edits. Rows are owned exclusively by the
//! [`RowStore`](crate::store::RowStore) and addressed by index from the
//! outside; the store keys its side tables by a stable [`RowId`] instead so
//! row insertion and removal can never misattribute a diff baseline.

use serde::{Deserialize, Serialize};

/// Lowest accepted sound-quality score.
pub const SOUND_QUALITY_MIN: i64 = 1;
/// Highest accepted sound-quality score.
pub const SOUND_QUALITY_MAX: i64 = 5;

/// One transcript annotation unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Audio file reference (relative to the transcript document).
    pub audio_file: String,
    /// Transcript text, space-delimited words.
    pub transcript: String,
    /// Words not pronounced properly, space-delimited.
    pub mispronounced: String,
    /// Semicolon-delimited tag list.
    pub tags: String,
    /// Sound-quality score, 1-5 once imported or edited (0 for a blank row).
    pub sound_quality: u8,
    /// ASR-quality flag, 0 or 1.
    pub asr_quality: u8,
    /// Whether the transcript was edited relative to the original import.
    pub transcript_edited: bool,
    /// Whether the mispronunciation notes were edited.
    pub mispronounced_edited: bool,
    /// Whether the tag list was edited.
    pub tags_edited: bool,
}

impl Row {
    /// Current text of an editable text column.
    pub fn text(&self, column: TextColumn) -> &str {
        match column {
            TextColumn::Transcript => &self.transcript,
            TextColumn::Mispronounced => &self.mispronounced,
            TextColumn::Tags => &self.tags,
        }
    }

    pub(crate) fn set_text(&mut self, column: TextColumn, value: String) {
        match column {
            TextColumn::Transcript => self.transcript = value,
            TextColumn::Mispronounced => self.mispronounced = value,
            TextColumn::Tags => self.tags = value,
        }
    }

    /// Edited flag of an editable text column.
    pub fn edited(&self, column: TextColumn) -> bool {
        match column {
            TextColumn::Transcript => self.transcript_edited,
            TextColumn::Mispronounced => self.mispronounced_edited,
            TextColumn::Tags => self.tags_edited,
        }
    }

    pub(crate) fn set_edited(&mut self, column: TextColumn, edited: bool) {
        match column {
            TextColumn::Transcript => self.transcript_edited = edited,
            TextColumn::Mispronounced => self.mispronounced_edited = edited,
            TextColumn::Tags => self.tags_edited = edited,
        }
    }
}

/// Stable per-row identifier.
///
/// Assigned by the store when a row is created and never reused, so side
/// tables keyed by it survive row insertion and removal without reindexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(pub(crate) u64);

/// Table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    /// Audio file reference.
    Audio,
    /// Transcript text.
    Transcript,
    /// Mispronunciation notes.
    Mispronounced,
    /// Tag list.
    Tags,
    /// Sound-quality score (1-5).
    SoundQuality,
    /// ASR-quality flag (0/1).
    AsrQuality,
}

impl Column {
    /// The editable text column this column corresponds to, if any.
    pub fn as_text(self) -> Option<TextColumn> {
        match self {
            Column::Transcript => Some(TextColumn::Transcript),
            Column::Mispronounced => Some(TextColumn::Mispronounced),
            Column::Tags => Some(TextColumn::Tags),
            _ => None,
        }
    }
}

impl From<TextColumn> for Column {
    fn from(column: TextColumn) -> Self {
        match column {
            TextColumn::Transcript => Column::Transcript,
            TextColumn::Mispronounced => Column::Mispronounced,
            TextColumn::Tags => Column::Tags,
        }
    }
}

/// One of the three editable text columns, which are the only columns with
/// diff tracking and edit history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextColumn {
    /// Transcript text.
    Transcript,
    /// Mispronunciation notes.
    Mispronounced,
    /// Tag list.
    Tags,
}

impl TextColumn {
    /// All editable text columns, in table order.
    pub const ALL: [TextColumn; 3] = [
        TextColumn::Transcript,
        TextColumn::Mispronounced,
        TextColumn::Tags,
    ];

    /// Word delimiter used when diffing this column.
    ///
    /// Tags are a semicolon-delimited list; the other columns hold
    /// space-delimited prose.
    pub fn delimiter(self) -> &'static str {
        match self {
            TextColumn::Tags => ";",
            _ => " ",
        }
    }
}

/// A value written into a cell through the store's single write entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    /// Text for the audio reference or an editable text column.
    Text(String),
    /// Integer for the quality-score columns.
    Number(i64),
}

/// Trim and collapse internal whitespace runs to a single space.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
