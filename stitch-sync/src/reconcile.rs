//! Three-way reconciliation planner.
//!
//! `plan` is pure: it looks at the current annotations, documents, and open
//! tickets and produces an ordered [`Plan`] of actions, without touching the
//! filesystem, git, or the tracker. All side effects live in the executor.
//!
//! Action ordering inside a plan is fixed: duplicate closures, document
//! creations, ticket creations, ticket updates, orphan closures. Duplicates
//! are collapsed first so the rest of the pass joins against a deduplicated
//! ticket set; documents created this run immediately join the document set,
//! so an annotation with neither document nor ticket converges in one run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use stitch_core::docstore;
use stitch_core::types::{Annotation, Document, Ticket, TicketPatch};
use stitch_core::Identity;

// ---------------------------------------------------------------------------
// Trigger
// ---------------------------------------------------------------------------

/// What started this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A normal push: only documents among the changed paths push updates.
    Push,
    /// A scheduled or manual full pass: every document may push updates.
    FullResync,
}

/// Run trigger plus the changed-path filter for push events.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    pub event: EventKind,
    /// Paths changed in the triggering push, when known. `None` means the
    /// changed set is unknown and every document is treated as changed.
    pub changed_paths: Option<Vec<PathBuf>>,
}

impl SyncTrigger {
    pub fn push(changed_paths: Option<Vec<PathBuf>>) -> Self {
        Self {
            event: EventKind::Push,
            changed_paths,
        }
    }

    pub fn full_resync() -> Self {
        Self {
            event: EventKind::FullResync,
            changed_paths: None,
        }
    }

    /// Whether this trigger lets `doc` push a content update to its ticket.
    ///
    /// Changed paths arrive repo-relative while document paths may be
    /// absolute, so a suffix match on whole path components is used.
    fn allows_update(&self, doc: &Document) -> bool {
        match self.event {
            EventKind::FullResync => true,
            EventKind::Push => match &self.changed_paths {
                None => true,
                Some(paths) => paths
                    .iter()
                    .any(|p| doc.path == *p || doc.path.ends_with(p)),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One mutation the executor should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Write a new document for an annotation that has none.
    CreateDocument { document: Document },
    /// Open a ticket for a document that has none, then rename the document
    /// to embed the ticket number.
    CreateTicket { document: Document },
    /// Overwrite a ticket's content from its document.
    UpdateTicket { number: u64, patch: TicketPatch },
    /// Close a ticket that duplicates a lower-numbered one.
    CloseDuplicate { number: u64, kept: u64 },
    /// Close a managed ticket whose document no longer exists.
    CloseOrphan { number: u64 },
}

/// Ordered actions plus non-fatal findings worth surfacing.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub actions: Vec<Action>,
    pub warnings: Vec<String>,
}

impl Plan {
    /// A converged state plans nothing.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Compute the plan that converges the three stores.
///
/// `tickets` must be the tracker's open tickets; closed tickets never
/// participate and are never reopened. The planner never produces two
/// actions against the same ticket.
pub fn plan(
    docs_dir: &Path,
    annotations: &[Annotation],
    documents: &[Document],
    tickets: &[Ticket],
    trigger: &SyncTrigger,
) -> Plan {
    let mut warnings = Vec::new();

    // Collapse duplicate tickets first: among open tickets sharing an
    // embedded identity, the lowest number survives.
    let mut duplicate_actions = Vec::new();
    let mut groups: BTreeMap<&Identity, Vec<&Ticket>> = BTreeMap::new();
    for ticket in tickets {
        if let Some(id) = &ticket.identity {
            groups.entry(id).or_default().push(ticket);
        }
    }
    let mut dropped: BTreeSet<u64> = BTreeSet::new();
    for (id, mut group) in groups {
        if group.len() < 2 {
            continue;
        }
        group.sort_by_key(|t| t.number);
        let kept = group[0].number;
        for dup in &group[1..] {
            tracing::info!(
                "ticket #{} duplicates #{kept} (identity {id}); closing",
                dup.number
            );
            duplicate_actions.push(Action::CloseDuplicate {
                number: dup.number,
                kept,
            });
            dropped.insert(dup.number);
        }
    }

    let live: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| !dropped.contains(&t.number))
        .collect();
    let ticket_by_identity: BTreeMap<&Identity, &Ticket> = live
        .iter()
        .filter_map(|t| t.identity.as_ref().map(|id| (id, *t)))
        .collect();
    let ticket_by_number: BTreeMap<u64, &Ticket> =
        live.iter().map(|t| (t.number, *t)).collect();

    // Documents created this run join the document set immediately, so a
    // brand-new annotation gets both its document and its ticket in one pass.
    let mut doc_identities: BTreeSet<Identity> =
        documents.iter().map(|d| d.identity()).collect();
    let mut create_doc_actions = Vec::new();
    let mut all_docs: Vec<(Document, bool)> =
        documents.iter().map(|d| (d.clone(), false)).collect();
    for annotation in annotations {
        if doc_identities.contains(&annotation.identity) {
            continue;
        }
        let document = docstore::document_from_annotation(docs_dir, annotation);
        doc_identities.insert(annotation.identity.clone());
        create_doc_actions.push(Action::CreateDocument {
            document: document.clone(),
        });
        all_docs.push((document, true));
    }

    let code_identities: BTreeSet<&Identity> =
        annotations.iter().map(|a| &a.identity).collect();

    let mut create_ticket_actions = Vec::new();
    let mut update_actions = Vec::new();
    let mut claimed: BTreeSet<u64> = BTreeSet::new();
    for (doc, created_now) in &all_docs {
        let identity = doc.identity();
        let ticket = ticket_by_identity
            .get(&identity)
            .copied()
            .or_else(|| doc.number.and_then(|n| ticket_by_number.get(&n).copied()));

        match ticket {
            Some(ticket) => {
                claimed.insert(ticket.number);
                if (*created_now || trigger.allows_update(doc)) && differs(doc, ticket) {
                    update_actions.push(Action::UpdateTicket {
                        number: ticket.number,
                        patch: patch_from(doc, ticket),
                    });
                }
            }
            None if doc.number.is_some() => {
                // Linked to a ticket that is no longer open. Closed tickets
                // stay closed; the document is kept as a record.
                warnings.push(format!(
                    "document {} references ticket #{} which is not open; leaving both as-is",
                    doc.filename,
                    doc.number.unwrap_or_default()
                ));
            }
            None if *created_now || code_identities.contains(&identity) => {
                create_ticket_actions.push(Action::CreateTicket {
                    document: doc.clone(),
                });
            }
            None => {
                // Document with neither annotation nor ticket: manually
                // authored or awaiting triage. Not ours to act on.
                tracing::debug!("document {} has no annotation and no ticket", doc.filename);
            }
        }
    }

    // Managed tickets nothing claimed have lost their document.
    let mut orphan_actions = Vec::new();
    for ticket in &live {
        if ticket.identity.is_some() && !claimed.contains(&ticket.number) {
            orphan_actions.push(Action::CloseOrphan {
                number: ticket.number,
            });
        }
    }

    let mut actions = duplicate_actions;
    actions.extend(create_doc_actions);
    actions.extend(create_ticket_actions);
    actions.extend(update_actions);
    actions.extend(orphan_actions);
    Plan { actions, warnings }
}

/// Content comparison between a document and its ticket. Identity markers are
/// outside this comparison; the ticket body is already marker-stripped.
fn differs(doc: &Document, ticket: &Ticket) -> bool {
    doc.front_matter.title != ticket.title
        || doc.body != ticket.body
        || doc.front_matter.labels != ticket.labels
        || doc.front_matter.assignees != ticket.assignees
}

/// Build the full-content patch for an update. The embedded identity is
/// preserved when the ticket already carries one, and established from the
/// document otherwise.
fn patch_from(doc: &Document, ticket: &Ticket) -> TicketPatch {
    TicketPatch {
        title: doc.front_matter.title.clone(),
        body: doc.body.clone(),
        labels: doc.front_matter.labels.clone(),
        assignees: doc.front_matter.assignees.clone(),
        identity: ticket.identity.clone().or_else(|| Some(doc.identity())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
