//! Domain types for the three work-item stores.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Label and assignee collections are `BTreeSet`s so serialized output
//! and comparisons are deterministic.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::identity::Identity;

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// An inline `TODO` marker found in a scanned source file.
///
/// Ephemeral: recomputed on every run from the current tree, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub identity: Identity,
    /// Path relative to the scan root.
    pub path: PathBuf,
    /// 1-based line number.
    pub line: u32,
    pub text: String,
}

impl Annotation {
    pub fn new(path: PathBuf, line: u32, text: String) -> Self {
        let identity = Identity::of_annotation(&path, line, &text);
        Self {
            identity,
            path,
            line,
            text,
        }
    }

    /// `file#L<line>` source reference used in document bodies.
    pub fn source_ref(&self) -> String {
        format!("{}#L{}", self.path.display(), self.line)
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Structured metadata block at the head of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FrontMatter {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub assignees: BTreeSet<String>,
}

/// A markdown document recording one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Full path on disk.
    pub path: PathBuf,
    pub filename: String,
    /// Leading ticket number, once linked (`<number>-...`).
    pub number: Option<u64>,
    /// Content-hash identity embedded in the filename (`todo-<hash>-...`).
    pub todo_id: Option<Identity>,
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    /// Resolve the join identity: the filename-embedded hash when present,
    /// otherwise a content hash of the document itself.
    pub fn identity(&self) -> Identity {
        match &self.todo_id {
            Some(id) => id.clone(),
            None => Identity::of_content(&self.front_matter.title, &self.body),
        }
    }
}

// ---------------------------------------------------------------------------
// Tickets
// ---------------------------------------------------------------------------

/// Lifecycle state of a tracker ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketState {
    Open,
    Closed,
}

impl fmt::Display for TicketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketState::Open => write!(f, "open"),
            TicketState::Closed => write!(f, "closed"),
        }
    }
}

/// A record in the external issue tracker.
///
/// `identity` is the embedded hash marker, extracted exactly once at the
/// client wire boundary; `body` never contains the marker text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
    pub state: TicketState,
    pub identity: Option<Identity>,
}

/// Request payload for ticket creation.
///
/// The client serializes `identity` as the hidden body marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTicket {
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
    pub identity: Identity,
}

/// Full-content update pushed to an existing ticket. Document content is
/// authoritative; the tracker side is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketPatch {
    pub title: String,
    pub body: String,
    pub labels: BTreeSet<String>,
    pub assignees: BTreeSet<String>,
    /// Marker to re-embed in the body. Preserves the ticket's existing
    /// identity when set; the join key never changes on update.
    pub identity: Option<Identity>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn annotation_identity_matches_fields() {
        let a = Annotation::new(PathBuf::from("src/lib.rs"), 7, "add tracing".into());
        assert_eq!(
            a.identity,
            Identity::of_annotation(Path::new("src/lib.rs"), 7, "add tracing")
        );
        assert_eq!(a.source_ref(), "src/lib.rs#L7");
    }

    #[test]
    fn document_identity_prefers_filename_hash() {
        let id = Identity::of_content("x", "y");
        let doc = Document {
            path: PathBuf::from("docs/todo-x.md"),
            filename: "todo-x.md".into(),
            number: None,
            todo_id: Some(id.clone()),
            front_matter: FrontMatter::default(),
            body: "anything".into(),
        };
        assert_eq!(doc.identity(), id);
    }

    #[test]
    fn document_identity_falls_back_to_content_hash() {
        let doc = Document {
            path: PathBuf::from("docs/idea.md"),
            filename: "idea.md".into(),
            number: None,
            todo_id: None,
            front_matter: FrontMatter {
                title: "An idea".into(),
                ..Default::default()
            },
            body: "details".into(),
        };
        assert_eq!(doc.identity(), Identity::of_content("An idea", "details"));
    }

    #[test]
    fn front_matter_defaults_are_empty() {
        let fm = FrontMatter::default();
        assert!(fm.title.is_empty());
        assert!(fm.labels.is_empty());
        assert!(fm.assignees.is_empty());
    }

    #[test]
    fn ticket_state_display() {
        assert_eq!(TicketState::Open.to_string(), "open");
        assert_eq!(TicketState::Closed.to_string(), "closed");
    }
}
