//! Markdown document store.
//!
//! # Storage layout
//!
//! ```text
//! <docs_dir>/                        (.github/issues/ by convention)
//!   todo-<hash>-<slug>.md            (created from an annotation, unlinked)
//!   <number>-todo-<hash>-<slug>.md   (linked to tracker ticket <number>)
//!   <anything>.md                    (manually authored, not yet linked)
//! ```
//!
//! # API pattern
//!
//! All functions take the documents directory explicitly (`_at` style) so
//! tests run against a `TempDir`. Writes use the atomic `.tmp` + rename
//! pattern; the ticket-number prefix is added exactly once, on first link.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{io_err, StoreError};
use crate::identity::{Identity, IDENTITY_LEN};
use crate::types::{Annotation, Document, FrontMatter};

const FRONT_MATTER_DELIM: &str = "---";
const SLUG_MAX_LEN: usize = 50;
const TITLE_MAX_LEN: usize = 100;

// ---------------------------------------------------------------------------
// Filename convention
// ---------------------------------------------------------------------------

/// Leading ticket number, if the filename carries one (`123-...`).
pub fn parse_ticket_number(filename: &str) -> Option<u64> {
    let (head, _) = filename.split_once('-')?;
    head.parse().ok()
}

/// Annotation hash embedded in the filename (`todo-<16 hex>`), with or
/// without a leading number prefix.
pub fn parse_todo_id(filename: &str) -> Option<Identity> {
    let start = filename.find("todo-")? + "todo-".len();
    let candidate = filename.get(start..start + IDENTITY_LEN)?;
    Identity::parse(candidate)
}

/// Lowercase, non-alphanumeric runs collapsed to `-`, trimmed, max 50 chars.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
        if slug.len() >= SLUG_MAX_LEN {
            break;
        }
    }
    slug.trim_matches('-').to_owned()
}

// ---------------------------------------------------------------------------
// Front matter
// ---------------------------------------------------------------------------

/// Split a document into front matter and body.
///
/// Absent or malformed YAML blocks degrade to [`FrontMatter::default`] with
/// the full content as body; parsing never fails the run.
pub fn parse_front_matter(content: &str) -> (FrontMatter, String) {
    let Some(rest) = content.strip_prefix("---\n") else {
        return (FrontMatter::default(), content.trim().to_owned());
    };
    let Some(end) = rest.find("\n---") else {
        return (FrontMatter::default(), content.trim().to_owned());
    };
    let yaml = &rest[..end];
    let body = rest[end + "\n---".len()..]
        .trim_start_matches('\n')
        .trim()
        .to_owned();

    match serde_yaml::from_str::<FrontMatter>(yaml) {
        Ok(fm) => (fm, body),
        Err(err) => {
            tracing::debug!("malformed front matter, treating as empty: {err}");
            (FrontMatter::default(), content.trim().to_owned())
        }
    }
}

/// Serialize a document back to `---` front matter plus body.
pub fn render_document(doc: &Document) -> Result<String, StoreError> {
    let yaml = serde_yaml::to_string(&doc.front_matter)?;
    Ok(format!(
        "{FRONT_MATTER_DELIM}\n{}{FRONT_MATTER_DELIM}\n\n{}\n",
        yaml,
        doc.body.trim()
    ))
}

// ---------------------------------------------------------------------------
// Document generation
// ---------------------------------------------------------------------------

/// Build the document a fresh annotation should produce: filename embeds the
/// content hash, front matter carries the derived title and inferred labels,
/// body records the source reference.
pub fn document_from_annotation(dir: &Path, annotation: &Annotation) -> Document {
    let slug = slugify(&annotation.text);
    let filename = if slug.is_empty() {
        format!("todo-{}.md", annotation.identity)
    } else {
        format!("todo-{}-{}.md", annotation.identity, slug)
    };

    let title: String = annotation.text.chars().take(TITLE_MAX_LEN).collect();
    let body = format!(
        "## TODO from code\n\n{}\n\n**Source**: `{}`",
        annotation.text,
        annotation.source_ref()
    );

    Document {
        path: dir.join(&filename),
        filename,
        number: None,
        todo_id: Some(annotation.identity.clone()),
        front_matter: FrontMatter {
            title,
            labels: infer_labels(annotation),
            assignees: Default::default(),
        },
        body,
    }
}

fn infer_labels(annotation: &Annotation) -> std::collections::BTreeSet<String> {
    let mut labels = std::collections::BTreeSet::new();
    labels.insert("todo".to_owned());

    let ext = annotation
        .path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "rs" => {
            labels.insert("rust".to_owned());
        }
        "py" => {
            labels.insert("python".to_owned());
        }
        "js" | "jsx" | "ts" | "tsx" => {
            labels.insert("javascript".to_owned());
        }
        "md" => {
            labels.insert("documentation".to_owned());
        }
        "yml" | "yaml" => {
            labels.insert("ci-cd".to_owned());
        }
        _ => {}
    }

    let text = annotation.text.to_ascii_lowercase();
    if ["test", "testing", "spec"].iter().any(|w| text.contains(w)) {
        labels.insert("testing".to_owned());
    }
    if ["fix", "bug", "error"].iter().any(|w| text.contains(w)) {
        labels.insert("bug".to_owned());
    }
    if ["doc", "readme"].iter().any(|w| text.contains(w)) {
        labels.insert("documentation".to_owned());
    }
    labels
}

// ---------------------------------------------------------------------------
// Enumerate
// ---------------------------------------------------------------------------

/// Enumerate all documents in `dir` with parsed front matter.
///
/// Returns an empty list if the directory does not exist. Individual files
/// that cannot be read are skipped with a debug log; a single bad file never
/// aborts the run. Results are sorted by filename for determinism.
pub fn list_documents_at(dir: &Path) -> Result<Vec<Document>, StoreError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(io_err(dir, err)),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "md").unwrap_or(false))
        .collect();
    files.sort();

    let mut docs = Vec::new();
    for path in files {
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                tracing::debug!("skipping unreadable document {}: {err}", path.display());
                continue;
            }
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (front_matter, body) = parse_front_matter(&content);
        docs.push(Document {
            number: parse_ticket_number(&filename),
            todo_id: parse_todo_id(&filename),
            path,
            filename,
            front_matter,
            body,
        });
    }
    Ok(docs)
}

// ---------------------------------------------------------------------------
// Write / rename
// ---------------------------------------------------------------------------

/// Atomically write a document to `<dir>/<filename>`.
///
/// Write flow: render → `.md.tmp` sibling → rename. Line endings are
/// normalised to LF.
pub fn write_document_at(dir: &Path, doc: &Document) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let path = dir.join(&doc.filename);
    let tmp = path.with_extension("md.tmp");

    let content = render_document(doc)?.replace("\r\n", "\n");
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(path)
}

/// Rename a document to embed its newly created ticket number:
/// `todo-<hash>-<slug>.md` → `<number>-todo-<hash>-<slug>.md`.
///
/// This is the only identity-affecting mutation a document ever receives and
/// it happens exactly once; a document that already carries a number is
/// refused.
pub fn rename_document_at(
    dir: &Path,
    doc: &Document,
    number: u64,
) -> Result<PathBuf, StoreError> {
    if let Some(existing) = doc.number {
        return Err(StoreError::AlreadyLinked {
            path: doc.path.clone(),
            number: existing,
        });
    }
    let new_filename = format!("{number}-{}", doc.filename);
    let new_path = dir.join(&new_filename);
    std::fs::rename(&doc.path, &new_path).map_err(|e| io_err(&doc.path, e))?;
    Ok(new_path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
