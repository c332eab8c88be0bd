//! Stitch — keep inline TODOs, markdown documents, and tracker tickets in step.
//!
//! # Usage
//!
//! ```text
//! stitch sync [--repo <owner/name>] [--event push|schedule] [--changed-files <paths>]
//!             [--docs-dir <dir>] [--dry-run] [--push] [--json]
//! stitch scan [--docs-dir <dir>] [--dry-run]
//! stitch status [--docs-dir <dir>] [--json]
//! ```
//!
//! `--repo` and the token fall back to `GITHUB_REPOSITORY` / `GITHUB_TOKEN`,
//! the trigger to `STITCH_EVENT` and `CHANGED_FILES`, so the binary drops
//! straight into a workflow step with no arguments at all.

mod commands;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{scan::ScanArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "stitch",
    version,
    about = "Reconcile code TODOs, markdown documents, and tracker tickets",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full three-way reconciliation against the tracker.
    Sync(SyncArgs),

    /// Record new code annotations as documents; never contacts the tracker.
    Scan(ScanArgs),

    /// Show counts across the three stores and pending work.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Shared event argument — parsed from CLI strings, converts to a trigger kind
// ---------------------------------------------------------------------------

/// Thin wrapper so clap can parse the triggering event from CLI args.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventArg {
    Push,
    Schedule,
}

impl FromStr for EventArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "schedule" | "workflow_dispatch" => Ok(Self::Schedule),
            other => Err(format!(
                "unknown event '{other}'; expected: push, schedule, workflow_dispatch"
            )),
        }
    }
}

impl fmt::Display for EventArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventArg::Push => write!(f, "push"),
            EventArg::Schedule => write!(f, "schedule"),
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Scan(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
