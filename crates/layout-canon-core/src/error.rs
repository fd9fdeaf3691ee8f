//! Error types for the layout canonicalizer
//!
//! Canonicalization itself is total over well-formed input and never fails.
//! Errors only arise at the edges: (de)serializing layouts, touching files,
//! or refusing a layout whose closure check did not pass.

use std::path::PathBuf;

/// Layout canonicalizer error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed storage-layout JSON, or a layout that cannot be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File access failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Referential closure check failed
    #[error("Check failed: {0}")]
    Check(String),
}

impl Error {
    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for canonicalizer operations
pub type Result<T> = std::result::Result<T, Error>;
