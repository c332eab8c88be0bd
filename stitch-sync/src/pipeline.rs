//! End-to-end run orchestration.
//!
//! A full run is scan → enumerate → list tickets → plan → execute → commit.
//! The tracker listing happens before any mutation, so an authentication
//! failure aborts the run with nothing changed.

use std::path::{Path, PathBuf};

use stitch_core::docstore;
use stitch_core::types::{NewTicket, Ticket, TicketPatch, TicketState};
use stitch_github::{TicketTracker, TrackerError};
use stitch_scan::scan_annotations;

use crate::error::SyncError;
use crate::executor::{execute, RunSummary};
use crate::git::GitBatch;
use crate::reconcile::{self, Action, SyncTrigger};

/// Commit message for a full sync run.
const SYNC_COMMIT_MESSAGE: &str = "stitch: sync work items";

/// Commit message for a documents-only scan run.
const SCAN_COMMIT_MESSAGE: &str = "stitch: record code annotations";

/// Inputs for a sync run.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Scan root, normally the repository checkout.
    pub root: PathBuf,
    /// Document directory, relative to `root` unless absolute.
    pub docs_dir: PathBuf,
    pub trigger: SyncTrigger,
    pub dry_run: bool,
    /// Push the batch commit after a successful run.
    pub push: bool,
}

impl RunParams {
    /// Resolved document directory.
    pub fn docs_path(&self) -> PathBuf {
        if self.docs_dir.is_absolute() {
            self.docs_dir.clone()
        } else {
            self.root.join(&self.docs_dir)
        }
    }
}

/// Full three-way sync run.
pub fn run(params: &RunParams, tracker: &dyn TicketTracker) -> Result<RunSummary, SyncError> {
    let docs_path = params.docs_path();
    let annotations = scan_annotations(&params.root, &params.docs_dir)?;
    let documents = docstore::list_documents_at(&docs_path)?;
    let tickets = tracker.list_tickets(TicketState::Open)?;
    tracing::info!(
        "scanned {} annotation(s), {} document(s), {} open ticket(s)",
        annotations.len(),
        documents.len(),
        tickets.len()
    );

    let plan = reconcile::plan(&docs_path, &annotations, &documents, &tickets, &params.trigger);
    if plan.is_empty() {
        tracing::info!("already converged; nothing to do");
    }

    let mut git = GitBatch::new(&params.root, params.dry_run);
    let summary = execute(plan, &docs_path, tracker, &mut git, params.dry_run)?;
    if git.commit(SYNC_COMMIT_MESSAGE)? && params.push {
        git.push()?;
    }
    Ok(summary)
}

/// Documents-only run: write missing documents for new annotations, commit,
/// and never contact the tracker. Used on pull requests, where tickets are
/// deferred until the branch lands.
pub fn run_scan(root: &Path, docs_dir: &Path, dry_run: bool) -> Result<RunSummary, SyncError> {
    let docs_path = if docs_dir.is_absolute() {
        docs_dir.to_path_buf()
    } else {
        root.join(docs_dir)
    };
    let annotations = scan_annotations(root, docs_dir)?;
    let documents = docstore::list_documents_at(&docs_path)?;

    let mut plan = reconcile::plan(
        &docs_path,
        &annotations,
        &documents,
        &[],
        &SyncTrigger::full_resync(),
    );
    plan.actions
        .retain(|a| matches!(a, Action::CreateDocument { .. }));
    plan.warnings.clear();

    let mut git = GitBatch::new(root, dry_run);
    let summary = execute(plan, &docs_path, &Disconnected, &mut git, dry_run)?;
    git.commit(SCAN_COMMIT_MESSAGE)?;
    Ok(summary)
}

/// Tracker stand-in for documents-only runs. A filtered plan never reaches
/// it; any call is a bug surfaced as an error rather than a panic.
struct Disconnected;

impl TicketTracker for Disconnected {
    fn list_tickets(&self, _state: TicketState) -> Result<Vec<Ticket>, TrackerError> {
        Err(TrackerError::Http("tracker unavailable in scan mode".into()))
    }

    fn create_ticket(&self, _req: &NewTicket) -> Result<u64, TrackerError> {
        Err(TrackerError::Http("tracker unavailable in scan mode".into()))
    }

    fn update_ticket(&self, _number: u64, _patch: &TicketPatch) -> Result<(), TrackerError> {
        Err(TrackerError::Http("tracker unavailable in scan mode".into()))
    }

    fn close_ticket(&self, _number: u64, _comment: &str) -> Result<(), TrackerError> {
        Err(TrackerError::Http("tracker unavailable in scan mode".into()))
    }
}
