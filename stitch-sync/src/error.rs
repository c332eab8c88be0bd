//! Error types for stitch-sync.

use thiserror::Error;

use stitch_core::StoreError;
use stitch_github::TrackerError;
use stitch_scan::ScanError;

use crate::git::GitError;

/// All errors that can arise from a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the document store.
    #[error("document store error: {0}")]
    Store(#[from] StoreError),

    /// An error from the annotation scanner.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// An error from the ticket tracker client.
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// An error from version-control batching.
    #[error("git error: {0}")]
    Git(#[from] GitError),
}

impl SyncError {
    /// Whether the run failed before any mutation could have happened.
    pub fn is_auth(&self) -> bool {
        matches!(self, SyncError::Tracker(e) if e.is_fatal())
    }
}
