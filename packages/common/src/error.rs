use thiserror::Error;

/// A path string that does not follow the `/type[ordinal]/...` grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed path '{path}': {reason}")]
pub struct MalformedPath {
    pub path: String,
    pub reason: String,
}

impl MalformedPath {
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised by document backends
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    MalformedPath(#[from] MalformedPath),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl CommonError {
    pub fn not_found(path: impl Into<String>) -> Self {
        CommonError::NotFound(path.into())
    }
}

impl From<String> for CommonError {
    fn from(s: String) -> Self {
        CommonError::Generic(s)
    }
}

impl From<&str> for CommonError {
    fn from(s: &str) -> Self {
        CommonError::Generic(s.to_string())
    }
}
