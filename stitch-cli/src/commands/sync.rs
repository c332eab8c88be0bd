//! `stitch sync` — full three-way reconciliation run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use stitch_github::GithubClient;
use stitch_sync::pipeline::{self, RunParams};
use stitch_sync::{RunSummary, SyncTrigger};

use crate::commands::{parse_changed_files, summary_line};
use crate::EventArg;

/// Arguments for `stitch sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Repository in `owner/name` form.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repo: String,

    /// API token used for tracker calls.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Triggering event: push (changed paths gate updates) or schedule
    /// (full resync).
    #[arg(long, env = "STITCH_EVENT", default_value = "push")]
    pub event: EventArg,

    /// Comma- or newline-separated changed paths; `-` means unknown.
    #[arg(long, env = "CHANGED_FILES")]
    pub changed_files: Option<String>,

    /// Directory holding the work-item documents.
    #[arg(long, default_value = ".github/issues")]
    pub docs_dir: PathBuf,

    /// Plan and report without writing, filing, or committing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Push the batch commit after a successful run.
    #[arg(long)]
    pub push: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let root = std::env::current_dir().context("could not determine working directory")?;
        let trigger = match self.event {
            EventArg::Push => {
                SyncTrigger::push(self.changed_files.as_deref().and_then(parse_changed_files))
            }
            EventArg::Schedule => SyncTrigger::full_resync(),
        };

        let client = GithubClient::new(&self.repo, &self.token);
        let params = RunParams {
            root,
            docs_dir: self.docs_dir.clone(),
            trigger,
            dry_run: self.dry_run,
            push: self.push,
        };
        let summary = pipeline::run(&params, &client)
            .with_context(|| format!("sync failed for '{}'", self.repo))?;

        if self.json {
            print_json(&summary)?;
            return Ok(());
        }
        for warning in &summary.warnings {
            eprintln!("{} {warning}", "warning:".yellow().bold());
        }
        println!("{}", summary_line(&summary, self.dry_run));
        Ok(())
    }
}

#[derive(Serialize)]
struct SummaryJson<'a> {
    docs_created: usize,
    tickets_created: usize,
    tickets_updated: usize,
    tickets_closed: usize,
    warnings: &'a [String],
}

fn print_json(summary: &RunSummary) -> Result<()> {
    let payload = SummaryJson {
        docs_created: summary.docs_created,
        tickets_created: summary.tickets_created,
        tickets_updated: summary.tickets_updated,
        tickets_closed: summary.tickets_closed,
        warnings: &summary.warnings,
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize sync JSON")?
    );
    Ok(())
}
