//! Word-count sidecar document.
//!
//! Cumulative edited-word totals survive across annotation sessions in a
//! small XML sidecar next to the transcript, under a `wordcount`
//! subdirectory, named `<transcript-basename>_wordcount.xml`. It is written
//! after every successful save and read back when a transcript is opened. A
//! missing or unreadable sidecar is not an error; the counters simply start
//! from zero again.

use std::fs;
use std::path::{Path, PathBuf};

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::{Deserialize, Serialize};

use crate::error::{LekhaError, Result};
use crate::row::TextColumn;

/// Name of the subdirectory holding sidecar documents.
const SIDECAR_DIR: &str = "wordcount";

/// The six model-wide word counters.
///
/// Totals come from the transcript import; edited counters accumulate the
/// heuristic edit magnitudes reported by the store's write path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCounts {
    /// Transcript words counted at import.
    pub transcript_total: u64,
    /// Mispronunciation words counted at import.
    pub mispronounced_total: u64,
    /// Tags counted at import.
    pub tagged_total: u64,
    /// Cumulative edited transcript words.
    pub transcript_edited: u64,
    /// Cumulative edited mispronunciation words.
    pub mispronounced_edited: u64,
    /// Cumulative edited tags.
    pub tagged_edited: u64,
}

impl WordCounts {
    /// Apply a signed delta to the edited counter of a text column.
    pub fn apply_delta(&mut self, column: TextColumn, delta: i64) {
        let counter = match column {
            TextColumn::Transcript => &mut self.transcript_edited,
            TextColumn::Mispronounced => &mut self.mispronounced_edited,
            TextColumn::Tags => &mut self.tagged_edited,
        };
        if delta >= 0 {
            *counter = counter.saturating_add(delta as u64);
        } else {
            *counter = counter.saturating_sub(delta.unsigned_abs());
        }
    }

    /// Add to the import total of a text column.
    pub(crate) fn add_total(&mut self, column: TextColumn, words: u64) {
        match column {
            TextColumn::Transcript => self.transcript_total += words,
            TextColumn::Mispronounced => self.mispronounced_total += words,
            TextColumn::Tags => self.tagged_total += words,
        }
    }

    /// Sidecar path for a transcript document:
    /// `<dir>/wordcount/<basename>_wordcount.xml`.
    pub fn sidecar_path(transcript_path: &Path) -> PathBuf {
        let dir = transcript_path.parent().unwrap_or_else(|| Path::new(""));
        let stem = transcript_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("transcript");
        dir.join(SIDECAR_DIR).join(format!("{stem}_wordcount.xml"))
    }

    /// Read the sidecar for `transcript_path`.
    ///
    /// Returns `None` when the sidecar is missing, unreadable, or malformed.
    pub fn load(transcript_path: &Path) -> Option<WordCounts> {
        let path = Self::sidecar_path(transcript_path);
        let xml = match fs::read_to_string(&path) {
            Ok(xml) => xml,
            Err(err) => {
                log::debug!("no word-count sidecar at '{}': {}", path.display(), err);
                return None;
            }
        };
        match Self::decode(&xml) {
            Ok(counts) => Some(counts),
            Err(err) => {
                log::warn!("ignoring malformed sidecar '{}': {}", path.display(), err);
                None
            }
        }
    }

    /// Write the sidecar for `transcript_path`, creating the `wordcount`
    /// directory if needed.
    pub fn save(&self, transcript_path: &Path) -> Result<()> {
        let path = Self::sidecar_path(transcript_path);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|source| LekhaError::DirCreate {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, self.encode()?).map_err(|source| LekhaError::FileWrite {
            path: path.clone(),
            source,
        })?;
        log::debug!("saved word counts to '{}'", path.display());
        Ok(())
    }

    /// Serialize to the sidecar XML format.
    pub fn encode(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new("wordcounts")))?;

        let fields = [
            ("transcript_edited", self.transcript_edited),
            ("mispronounced_edited", self.mispronounced_edited),
            ("tagged_edited", self.tagged_edited),
            ("transcript_total", self.transcript_total),
            ("mispronounced_total", self.mispronounced_total),
            ("tagged_total", self.tagged_total),
        ];
        for (name, value) in fields {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(&value.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }

        writer.write_event(Event::End(BytesEnd::new("wordcounts")))?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Parse the sidecar XML format. Unknown elements and unparseable
    /// numbers are ignored and leave the corresponding counter at zero.
    pub fn decode(xml: &str) -> Result<WordCounts> {
        let mut reader = Reader::from_reader(xml.as_bytes());
        let mut counts = WordCounts::default();
        let mut current: Option<Vec<u8>> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => current = Some(e.name().as_ref().to_vec()),
                Event::Text(t) => {
                    if let Some(name) = current.take() {
                        let value = t.unescape()?.trim().parse::<u64>().unwrap_or(0);
                        match name.as_slice() {
                            b"transcript_edited" => counts.transcript_edited = value,
                            b"mispronounced_edited" => counts.mispronounced_edited = value,
                            b"tagged_edited" => counts.tagged_edited = value,
                            b"transcript_total" => counts.transcript_total = value,
                            b"mispronounced_total" => counts.mispronounced_total = value,
                            b"tagged_total" => counts.tagged_total = value,
                            _ => {}
                        }
                    }
                }
                Event::End(_) => current = None,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sidecar_path() {
        let path = WordCounts::sidecar_path(Path::new("/data/session1/batch.xml"));
        assert_eq!(
            path,
            Path::new("/data/session1/wordcount/batch_wordcount.xml")
        );
    }

    #[test]
    fn test_sidecar_path_without_extension() {
        let path = WordCounts::sidecar_path(Path::new("batch"));
        assert_eq!(path, Path::new("wordcount/batch_wordcount.xml"));
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let counts = WordCounts {
            transcript_total: 120,
            mispronounced_total: 8,
            tagged_total: 15,
            transcript_edited: 42,
            mispronounced_edited: 3,
            tagged_edited: 7,
        };
        let xml = counts.encode().unwrap();
        assert!(xml.contains("<transcript_edited>42</transcript_edited>"));
        assert_eq!(WordCounts::decode(&xml).unwrap(), counts);
    }

    #[test]
    fn test_decode_tolerates_junk() {
        let xml = "<wordcounts><transcript_total>9</transcript_total>\
                   <unknown>5</unknown><tagged_edited>oops</tagged_edited></wordcounts>";
        let counts = WordCounts::decode(xml).unwrap();
        assert_eq!(counts.transcript_total, 9);
        assert_eq!(counts.tagged_edited, 0);
        assert_eq!(counts.mispronounced_total, 0);
    }

    #[test]
    fn test_apply_delta() {
        let mut counts = WordCounts::default();
        counts.apply_delta(TextColumn::Transcript, 5);
        counts.apply_delta(TextColumn::Transcript, -2);
        counts.apply_delta(TextColumn::Tags, 1);
        assert_eq!(counts.transcript_edited, 3);
        assert_eq!(counts.tagged_edited, 1);

        // Deltas below zero saturate rather than wrap
        counts.apply_delta(TextColumn::Tags, -9);
        assert_eq!(counts.tagged_edited, 0);
    }

    #[test]
    fn test_load_missing_sidecar() {
        assert!(WordCounts::load(Path::new("/nonexistent/batch.xml")).is_none());
    }
}
