pub mod scan;
pub mod status;
pub mod sync;

use std::path::PathBuf;

use stitch_sync::RunSummary;

/// Split a `CHANGED_FILES`-style value into paths. Accepts comma or newline
/// separators; `-` or an empty value means the changed set is unknown.
pub fn parse_changed_files(raw: &str) -> Option<Vec<PathBuf>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return None;
    }
    let paths: Vec<PathBuf> = trimmed
        .split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect();
    if paths.is_empty() {
        None
    } else {
        Some(paths)
    }
}

/// Human summary line shared by `sync` and `scan`.
pub fn summary_line(summary: &RunSummary, dry_run: bool) -> String {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if summary.is_noop() {
        return format!("{prefix}✓ nothing to do, stores already converged");
    }
    format!(
        "{prefix}✓ {} document(s) created, {} ticket(s) opened, {} updated, {} closed",
        summary.docs_created,
        summary.tickets_created,
        summary.tickets_updated,
        summary.tickets_closed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_files_accepts_both_separators() {
        assert_eq!(
            parse_changed_files("a.rs,b.rs"),
            Some(vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")])
        );
        assert_eq!(
            parse_changed_files("a.rs\n b.rs \n"),
            Some(vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")])
        );
    }

    #[test]
    fn changed_files_sentinels_mean_unknown() {
        assert_eq!(parse_changed_files(""), None);
        assert_eq!(parse_changed_files("-"), None);
        assert_eq!(parse_changed_files(" , ,"), None);
    }
}
