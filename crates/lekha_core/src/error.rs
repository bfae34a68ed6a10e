use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Unified error type for lekha operations
#[derive(Debug, Error)]
pub enum LekhaError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    // Document errors
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Malformed transcript document: {0}")]
    MalformedTranscript(String),

    // Annotator errors
    #[error("No transcript is open; save_as requires an explicit path first")]
    NoTranscriptPath,
}

/// Result type alias for lekha operations
pub type Result<T> = std::result::Result<T, LekhaError>;

/// A serializable representation of LekhaError for IPC with a UI shell
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
}

impl From<&LekhaError> for SerializableError {
    fn from(err: &LekhaError) -> Self {
        let kind = match err {
            LekhaError::Io(_) => "Io",
            LekhaError::FileRead { .. } => "FileRead",
            LekhaError::FileWrite { .. } => "FileWrite",
            LekhaError::DirCreate { .. } => "DirCreate",
            LekhaError::Xml(_) => "Xml",
            LekhaError::MalformedTranscript(_) => "MalformedTranscript",
            LekhaError::NoTranscriptPath => "NoTranscriptPath",
        }
        .to_string();

        let path = match err {
            LekhaError::FileRead { path, .. } => Some(path.clone()),
            LekhaError::FileWrite { path, .. } => Some(path.clone()),
            LekhaError::DirCreate { path, .. } => Some(path.clone()),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
        }
    }
}

impl From<LekhaError> for SerializableError {
    fn from(err: LekhaError) -> Self {
        SerializableError::from(&err)
    }
}

impl LekhaError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }
}
