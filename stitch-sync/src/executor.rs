//! Plan execution.
//!
//! Applies a [`Plan`] in order: filesystem writes through the docstore,
//! tracker mutations through the [`TicketTracker`] trait object, and path
//! staging through the [`GitBatch`]. The first failed action aborts the rest
//! of the run; already-applied actions are not rolled back, the next run
//! re-converges from whatever state was reached.

use std::path::Path;

use stitch_core::docstore;
use stitch_core::types::NewTicket;
use stitch_github::TicketTracker;

use crate::error::SyncError;
use crate::git::GitBatch;
use crate::reconcile::{Action, Plan};

/// Closing comment left on tickets whose document has disappeared.
pub const ORPHAN_COMMENT: &str = "Cancelled - no matching documentation found";

/// What a run did (or, under dry-run, would have done).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub docs_created: usize,
    pub tickets_created: usize,
    pub tickets_updated: usize,
    pub tickets_closed: usize,
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// Total mutations across all three stores.
    pub fn mutations(&self) -> usize {
        self.docs_created + self.tickets_created + self.tickets_updated + self.tickets_closed
    }

    pub fn is_noop(&self) -> bool {
        self.mutations() == 0
    }
}

/// Apply `plan` against `docs_dir`, `tracker`, and `git`.
///
/// Under `dry_run` every action is logged and counted but nothing is written
/// anywhere. Document creation and the create-then-rename ticket link stage
/// their paths in `git`; the caller commits once afterwards.
pub fn execute(
    plan: Plan,
    docs_dir: &Path,
    tracker: &dyn TicketTracker,
    git: &mut GitBatch,
    dry_run: bool,
) -> Result<RunSummary, SyncError> {
    let mut summary = RunSummary {
        warnings: plan.warnings,
        ..Default::default()
    };
    for warning in &summary.warnings {
        tracing::warn!("{warning}");
    }

    for action in plan.actions {
        match action {
            Action::CreateDocument { document } => {
                if dry_run {
                    tracing::info!("[dry-run] would create document {}", document.filename);
                } else {
                    let path = docstore::write_document_at(docs_dir, &document)?;
                    git.add(&path)?;
                    tracing::info!("created document {}", document.filename);
                }
                summary.docs_created += 1;
            }
            Action::CreateTicket { document } => {
                if dry_run {
                    tracing::info!(
                        "[dry-run] would open ticket for document {}",
                        document.filename
                    );
                    summary.tickets_created += 1;
                    continue;
                }
                let req = NewTicket {
                    title: document.front_matter.title.clone(),
                    body: document.body.clone(),
                    labels: document.front_matter.labels.clone(),
                    assignees: document.front_matter.assignees.clone(),
                    identity: document.identity(),
                };
                let number = tracker.create_ticket(&req)?;
                let new_path = docstore::rename_document_at(docs_dir, &document, number)?;
                // Staging the vacated path records the deletion half of the
                // rename.
                git.add(&document.path)?;
                git.add(&new_path)?;
                tracing::info!(
                    "opened ticket #{number} for document {}",
                    document.filename
                );
                summary.tickets_created += 1;
            }
            Action::UpdateTicket { number, patch } => {
                if dry_run {
                    tracing::info!("[dry-run] would update ticket #{number}");
                } else {
                    tracker.update_ticket(number, &patch)?;
                }
                summary.tickets_updated += 1;
            }
            Action::CloseDuplicate { number, kept } => {
                if dry_run {
                    tracing::info!("[dry-run] would close #{number} as duplicate of #{kept}");
                } else {
                    tracker.close_ticket(number, &format!("Duplicate of #{kept}"))?;
                }
                summary.tickets_closed += 1;
            }
            Action::CloseOrphan { number } => {
                if dry_run {
                    tracing::info!("[dry-run] would close orphaned ticket #{number}");
                } else {
                    tracker.close_ticket(number, ORPHAN_COMMENT)?;
                }
                summary.tickets_closed += 1;
            }
        }
    }

    Ok(summary)
}
