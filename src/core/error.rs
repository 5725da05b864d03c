use std::io;
use thiserror::Error;

/// Errors that abort a run before a report can be produced.
///
/// Document defects are never reported through this type; they become
/// [`crate::core::finding::Finding`]s instead.
#[derive(Error, Debug)]
pub enum DocgateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Schema error: {0}")]
    SchemaError(String),
    #[error("Path error: {0}")]
    PathError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl DocgateError {
    /// Wraps an I/O failure with the path that triggered it.
    pub fn io_at(path: &std::path::Path, err: io::Error) -> Self {
        DocgateError::IoError(io::Error::new(
            err.kind(),
            format!("{}: {}", path.display(), err),
        ))
    }
}
