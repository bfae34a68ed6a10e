#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Annotator facade (open/save orchestration)
pub mod annotator;

/// Diff engine (word-level distance and difference counts)
pub mod diff;

/// Transcript document codec
pub mod document;

/// Error (common error types)
pub mod error;

/// Store change notifications
pub mod events;

/// Edit tracker (per-cell history and cached counts)
pub mod history;

/// Row and column types
pub mod row;

/// Row store (single source of truth for displayed data)
pub mod store;

/// Transliteration completion session
#[cfg(feature = "transliteration")]
pub mod transliterate;

/// Word-count sidecar document
pub mod wordcount;
