//! `stitch status` — visibility across the three stores.
//!
//! Annotation and document counts come from the local tree. Ticket counts and
//! the pending-action breakdown need tracker credentials; without them the
//! tracker columns read `-` and the command still succeeds.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use stitch_core::docstore;
use stitch_core::types::TicketState;
use stitch_github::{GithubClient, TicketTracker};
use stitch_scan::scan_annotations;
use stitch_sync::reconcile::{self, SyncTrigger};
use stitch_sync::Action;

/// Arguments for `stitch status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Repository in `owner/name` form; enables the tracker columns.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: Option<String>,

    /// API token used for tracker calls.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory holding the work-item documents.
    #[arg(long, default_value = ".github/issues")]
    pub docs_dir: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let root = std::env::current_dir().context("could not determine working directory")?;
        let docs_path = if self.docs_dir.is_absolute() {
            self.docs_dir.clone()
        } else {
            root.join(&self.docs_dir)
        };

        let annotations =
            scan_annotations(&root, &self.docs_dir).context("failed to scan annotations")?;
        let documents =
            docstore::list_documents_at(&docs_path).context("failed to list documents")?;
        let linked = documents.iter().filter(|d| d.number.is_some()).count();

        let tracker = match (&self.repo, &self.token) {
            (Some(repo), Some(token)) => {
                let client = GithubClient::new(repo, token);
                let tickets = client
                    .list_tickets(TicketState::Open)
                    .with_context(|| format!("failed to list open tickets in '{repo}'"))?;
                let managed = tickets.iter().filter(|t| t.identity.is_some()).count();
                let plan = reconcile::plan(
                    &docs_path,
                    &annotations,
                    &documents,
                    &tickets,
                    &SyncTrigger::full_resync(),
                );
                let orphans = plan
                    .actions
                    .iter()
                    .filter(|a| matches!(a, Action::CloseOrphan { .. }))
                    .count();
                Some(TrackerStatus {
                    open_tickets: tickets.len(),
                    managed,
                    orphans,
                    pending_actions: plan.actions.len(),
                })
            }
            _ => None,
        };

        let report = StatusReport {
            annotations: annotations.len(),
            documents: documents.len(),
            linked,
            unlinked: documents.len() - linked,
            tracker,
        };
        if self.json {
            print_json(&report)?;
        } else {
            print_table(&report);
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TrackerStatus {
    open_tickets: usize,
    managed: usize,
    orphans: usize,
    pending_actions: usize,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    annotations: usize,
    documents: usize,
    linked: usize,
    unlinked: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    tracker: Option<TrackerStatus>,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "store")]
    store: String,
    #[tabled(rename = "count")]
    count: String,
    #[tabled(rename = "detail")]
    detail: String,
}

fn print_table(report: &StatusReport) {
    println!("Stitch v{}", env!("CARGO_PKG_VERSION"));

    let mut rows = vec![
        StatusTableRow {
            store: "annotations".into(),
            count: report.annotations.to_string(),
            detail: String::new(),
        },
        StatusTableRow {
            store: "documents".into(),
            count: report.documents.to_string(),
            detail: format!("{} linked, {} unlinked", report.linked, report.unlinked),
        },
    ];
    match &report.tracker {
        Some(tracker) => {
            rows.push(StatusTableRow {
                store: "open tickets".into(),
                count: tracker.open_tickets.to_string(),
                detail: format!("{} managed, {} orphaned", tracker.managed, tracker.orphans),
            });
            rows.push(StatusTableRow {
                store: "pending actions".into(),
                count: tracker.pending_actions.to_string(),
                detail: String::new(),
            });
        }
        None => {
            rows.push(StatusTableRow {
                store: "open tickets".into(),
                count: "-".into(),
                detail: "set --repo and --token for tracker columns".into(),
            });
        }
    }

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");

    if let Some(tracker) = &report.tracker {
        if tracker.pending_actions == 0 {
            println!("{}", "✓ stores converged".green());
        } else {
            println!(
                "{}",
                format!("{} action(s) pending — run `stitch sync`", tracker.pending_actions)
                    .yellow()
            );
        }
    }
}

fn print_json(report: &StatusReport) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(report).context("failed to serialize status JSON")?
    );
    Ok(())
}
