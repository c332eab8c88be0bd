//! `stitch scan` — documents-only pass for pull requests.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use stitch_sync::pipeline;

use crate::commands::summary_line;

/// Arguments for `stitch scan`.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory holding the work-item documents.
    #[arg(long, default_value = ".github/issues")]
    pub docs_dir: PathBuf,

    /// Report what would be recorded without writing or committing.
    #[arg(long)]
    pub dry_run: bool,
}

impl ScanArgs {
    pub fn run(self) -> Result<()> {
        let root = std::env::current_dir().context("could not determine working directory")?;
        let summary =
            pipeline::run_scan(&root, &self.docs_dir, self.dry_run).context("scan failed")?;
        println!("{}", summary_line(&summary, self.dry_run));
        Ok(())
    }
}
