//! Error types for the editor

use cpacs_common::{CommonError, MalformedPath};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    /// The mirror tree or the domain model is not available
    #[error("No document is loaded")]
    NotBuilt,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    MalformedPath(#[from] MalformedPath),

    #[error("Edit rejected: {0}")]
    DomainRejected(String),

    #[error("Snapshot could not be restored: {0}")]
    SnapshotCorrupt(String),

    #[error("Row {row} is out of range for a node with {len} children")]
    InvalidRow { row: usize, len: usize },

    #[error("A structural change is already in progress")]
    BracketOpen,

    #[error("Parse error: {0}")]
    Parse(#[from] cpacs_parser::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Document is not file-backed")]
    NotFileBacked,
}

impl EditorError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EditorError::NotFound(what.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        EditorError::DomainRejected(reason.into())
    }
}

impl From<CommonError> for EditorError {
    fn from(e: CommonError) -> Self {
        match e {
            CommonError::NotFound(path) => EditorError::NotFound(path),
            CommonError::MalformedPath(m) => EditorError::MalformedPath(m),
            CommonError::Io(io) => EditorError::Io(io),
            CommonError::Generic(msg) => EditorError::Backend(msg),
        }
    }
}
