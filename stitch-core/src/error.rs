//! Error types for stitch-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (front matter write path).
    ///
    /// Parse failures never surface here: malformed front matter on the read
    /// path degrades to empty metadata instead.
    #[error("front matter YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Attempted to re-number a document already linked to a ticket.
    #[error("document {path} is already linked to ticket #{number}")]
    AlreadyLinked { path: PathBuf, number: u64 },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
