//! Annotation scanning for `stitch-scan`.
//!
//! `scan_annotations(root)` walks a file tree and returns every inline `TODO`
//! marker as an [`Annotation`], identified by content hash. Individual files
//! that cannot be read are skipped; a single unreadable file never aborts a
//! scan.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;

use stitch_core::types::Annotation;

/// Directory names never descended into.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".venv",
    "venv",
    ".next",
];

/// File extensions eligible for scanning.
const EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "jsx", "ts", "tsx", "md", "yml", "yaml", "json", "sh", "css", "html",
    "toml",
];

/// `// TODO: text`, `# TODO text`, `<!-- TODO: text -->`, `/* TODO text */`.
/// A `#` preceded by another `#` is a markdown heading, not a comment.
const TODO_PATTERN: &str =
    r"(?i)(?://|(?:^|[^#])#|<!--|/\*)\s*TODO:?\s*(.+?)(?:\s*(?:-->|\*/))?\s*$";

/// Errors from annotation scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root itself cannot be walked.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Scan `root` for TODO annotations.
///
/// Paths in the result are relative to `root`; output is ordered by path,
/// then line, so repeated scans of an unchanged tree are identical. The
/// documents directory (`docs_dir`, relative or absolute) is excluded so
/// generated documents never feed back into the scan.
pub fn scan_annotations(root: &Path, docs_dir: &Path) -> Result<Vec<Annotation>, ScanError> {
    let pattern = Regex::new(TODO_PATTERN).expect("TODO pattern is valid");
    let skip_abs = if docs_dir.is_absolute() {
        docs_dir.to_path_buf()
    } else {
        root.join(docs_dir)
    };

    let mut annotations = Vec::new();
    walk(root, root, &skip_abs, &pattern, &mut annotations)?;
    annotations.sort_by(|a, b| a.path.cmp(&b.path).then(a.line.cmp(&b.line)));
    Ok(annotations)
}

fn walk(
    dir: &Path,
    root: &Path,
    skip_abs: &Path,
    pattern: &Regex,
    out: &mut Vec<Annotation>,
) -> Result<(), ScanError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if dir == root => {
            return Err(ScanError::Io {
                path: dir.to_path_buf(),
                source: err,
            })
        }
        Err(err) => {
            tracing::debug!("skipping unreadable directory {}: {err}", dir.display());
            return Ok(());
        }
    };

    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_dir() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if SKIP_DIRS.contains(&name.as_str()) || path == skip_abs {
                continue;
            }
            walk(&path, root, skip_abs, pattern, out)?;
        } else if eligible(&path) {
            scan_file(&path, root, pattern, out);
        }
    }
    Ok(())
}

fn eligible(path: &Path) -> bool {
    path.extension()
        .map(|e| {
            let ext = e.to_string_lossy().to_ascii_lowercase();
            EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn scan_file(path: &Path, root: &Path, pattern: &Regex, out: &mut Vec<Annotation>) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::InvalidData => return, // binary-ish, skip
        Err(err) => {
            tracing::debug!("skipping unreadable file {}: {err}", path.display());
            return;
        }
    };

    let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    for (idx, line) in content.lines().enumerate() {
        if let Some(captures) = pattern.captures(line) {
            let text = captures[1].trim().to_owned();
            if text.is_empty() {
                continue;
            }
            out.push(Annotation::new(relative.clone(), idx as u32 + 1, text));
        }
    }
}
