//! End-to-end pipeline tests against a temp tree and an in-memory tracker.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use stitch_core::types::{NewTicket, Ticket, TicketPatch, TicketState};
use stitch_github::{TicketTracker, TrackerError};
use stitch_sync::executor::ORPHAN_COMMENT;
use stitch_sync::pipeline::{run, run_scan, RunParams};
use stitch_sync::SyncTrigger;

// ---------------------------------------------------------------------------
// Mock tracker
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MockTracker {
    tickets: RefCell<Vec<Ticket>>,
    comments: RefCell<Vec<(u64, String)>>,
    next_number: RefCell<u64>,
    fail_create: bool,
}

impl MockTracker {
    fn new() -> Self {
        Self {
            next_number: RefCell::new(1),
            ..Default::default()
        }
    }

    fn seed(&self, ticket: Ticket) {
        let mut next = self.next_number.borrow_mut();
        *next = (*next).max(ticket.number + 1);
        self.tickets.borrow_mut().push(ticket);
    }

    fn open_tickets(&self) -> Vec<Ticket> {
        self.tickets
            .borrow()
            .iter()
            .filter(|t| t.state == TicketState::Open)
            .cloned()
            .collect()
    }

    fn comments_on(&self, number: u64) -> Vec<String> {
        self.comments
            .borrow()
            .iter()
            .filter(|(n, _)| *n == number)
            .map(|(_, c)| c.clone())
            .collect()
    }
}

impl TicketTracker for MockTracker {
    fn list_tickets(&self, state: TicketState) -> Result<Vec<Ticket>, TrackerError> {
        Ok(self
            .tickets
            .borrow()
            .iter()
            .filter(|t| t.state == state)
            .cloned()
            .collect())
    }

    fn create_ticket(&self, req: &NewTicket) -> Result<u64, TrackerError> {
        if self.fail_create {
            return Err(TrackerError::Http("injected create failure".into()));
        }
        let number = *self.next_number.borrow();
        *self.next_number.borrow_mut() += 1;
        self.tickets.borrow_mut().push(Ticket {
            number,
            title: req.title.clone(),
            body: req.body.clone(),
            labels: req.labels.clone(),
            assignees: req.assignees.clone(),
            state: TicketState::Open,
            identity: Some(req.identity.clone()),
        });
        Ok(number)
    }

    fn update_ticket(&self, number: u64, patch: &TicketPatch) -> Result<(), TrackerError> {
        let mut tickets = self.tickets.borrow_mut();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.number == number)
            .ok_or_else(|| TrackerError::NotFound(format!("issue #{number}")))?;
        ticket.title = patch.title.clone();
        ticket.body = patch.body.clone();
        ticket.labels = patch.labels.clone();
        ticket.assignees = patch.assignees.clone();
        if patch.identity.is_some() {
            ticket.identity = patch.identity.clone();
        }
        Ok(())
    }

    fn close_ticket(&self, number: u64, comment: &str) -> Result<(), TrackerError> {
        if !comment.is_empty() {
            self.comments
                .borrow_mut()
                .push((number, comment.to_owned()));
        }
        let mut tickets = self.tickets.borrow_mut();
        let ticket = tickets
            .iter_mut()
            .find(|t| t.number == number)
            .ok_or_else(|| TrackerError::NotFound(format!("issue #{number}")))?;
        ticket.state = TicketState::Closed;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const DOCS_DIR: &str = ".github/issues";

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn params(root: &Path) -> RunParams {
    init_logs();
    RunParams {
        root: root.to_path_buf(),
        docs_dir: PathBuf::from(DOCS_DIR),
        trigger: SyncTrigger::full_resync(),
        dry_run: false,
        push: false,
    }
}

fn write_source(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn doc_filenames(root: &Path) -> Vec<String> {
    let dir = root.join(DOCS_DIR);
    if !dir.exists() {
        return vec![];
    }
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn first_run_creates_document_and_ticket() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "fn main() {}\n// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    let summary = run(&params(tmp.path()), &tracker).unwrap();

    assert_eq!(summary.docs_created, 1);
    assert_eq!(summary.tickets_created, 1);
    assert_eq!(summary.tickets_updated, 0);
    assert_eq!(summary.tickets_closed, 0);

    // The document carries both the ticket number and the content hash.
    let names = doc_filenames(tmp.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("1-todo-"), "got {}", names[0]);
    assert!(names[0].ends_with("-add-retry-logic.md"), "got {}", names[0]);

    let open = tracker.open_tickets();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].title, "add retry logic");
    assert!(open[0].identity.is_some());
    assert!(open[0].labels.contains("todo"));
    assert!(open[0].labels.contains("rust"));
    assert!(open[0].body.contains("src/main.rs#L2"));
}

#[test]
fn second_run_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();
    let before = tracker.open_tickets();
    let names_before = doc_filenames(tmp.path());

    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert!(summary.is_noop(), "{summary:?}");
    assert_eq!(tracker.open_tickets(), before);
    assert_eq!(doc_filenames(tmp.path()), names_before);
}

#[test]
fn removed_annotation_keeps_document_and_ticket() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();

    // The annotation is resolved in code; the pair stays as the work record.
    write_source(tmp.path(), "src/main.rs", "fn main() {}\n");
    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert!(summary.is_noop(), "{summary:?}");
    assert_eq!(tracker.open_tickets().len(), 1);
    assert_eq!(doc_filenames(tmp.path()).len(), 1);
}

#[test]
fn deleted_document_orphans_its_ticket() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();

    write_source(tmp.path(), "src/main.rs", "fn main() {}\n");
    for name in doc_filenames(tmp.path()) {
        fs::remove_file(tmp.path().join(DOCS_DIR).join(name)).unwrap();
    }

    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert_eq!(summary.tickets_closed, 1);
    assert!(tracker.open_tickets().is_empty());
    assert_eq!(tracker.comments_on(1), vec![ORPHAN_COMMENT.to_owned()]);
}

#[test]
fn duplicate_tickets_collapse_to_lowest_number() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();
    let original = tracker.open_tickets().remove(0);

    // A retry gone wrong filed the same work item twice more.
    for number in [2, 3] {
        tracker.seed(Ticket {
            number,
            ..original.clone()
        });
    }

    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert_eq!(summary.tickets_closed, 2);
    let open = tracker.open_tickets();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].number, 1);
    assert_eq!(tracker.comments_on(2), vec!["Duplicate of #1".to_owned()]);
    assert_eq!(tracker.comments_on(3), vec!["Duplicate of #1".to_owned()]);
}

#[test]
fn edited_document_pushes_content_to_ticket() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();

    // Rewrite the document body by hand; front matter and filename stay.
    let name = doc_filenames(tmp.path()).remove(0);
    let path = tmp.path().join(DOCS_DIR).join(&name);
    let content = fs::read_to_string(&path).unwrap();
    let edited = content.replace("add retry logic", "add retry logic with backoff");
    fs::write(&path, edited).unwrap();

    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert_eq!(summary.tickets_updated, 1);
    let open = tracker.open_tickets();
    assert!(open[0].body.contains("with backoff"));
    assert!(open[0].identity.is_some(), "identity survives updates");
}

#[test]
fn dry_run_reports_without_mutating() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    let mut p = params(tmp.path());
    p.dry_run = true;
    let summary = run(&p, &tracker).unwrap();

    assert_eq!(summary.docs_created, 1);
    assert_eq!(summary.tickets_created, 1);
    assert!(doc_filenames(tmp.path()).is_empty());
    assert!(tracker.open_tickets().is_empty());
}

#[test]
fn failed_create_aborts_but_keeps_document() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker {
        fail_create: true,
        ..MockTracker::new()
    };
    let err = run(&params(tmp.path()), &tracker).unwrap_err();
    assert!(err.to_string().contains("injected create failure"));

    // No rollback: the document written before the failure survives, and the
    // next healthy run picks it up.
    let names = doc_filenames(tmp.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("todo-"), "unlinked: {}", names[0]);

    let healthy = MockTracker::new();
    let summary = run(&params(tmp.path()), &healthy).unwrap();
    assert_eq!(summary.tickets_created, 1);
    assert_eq!(summary.docs_created, 0);
    assert!(doc_filenames(tmp.path())[0].starts_with("1-todo-"));
}

#[test]
fn scan_mode_writes_documents_only() {
    init_logs();
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let summary = run_scan(tmp.path(), Path::new(DOCS_DIR), false).unwrap();
    assert_eq!(summary.docs_created, 1);
    assert_eq!(summary.tickets_created, 0);

    let names = doc_filenames(tmp.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("todo-"), "no ticket number: {}", names[0]);

    // Re-running changes nothing.
    let again = run_scan(tmp.path(), Path::new(DOCS_DIR), false).unwrap();
    assert!(again.is_noop());
}

#[test]
fn push_trigger_leaves_unchanged_documents_alone() {
    let tmp = TempDir::new().unwrap();
    write_source(tmp.path(), "src/main.rs", "// TODO: add retry logic\n");

    let tracker = MockTracker::new();
    run(&params(tmp.path()), &tracker).unwrap();

    // Drift the ticket title behind the document's back.
    tracker
        .update_ticket(
            1,
            &TicketPatch {
                title: "drifted".into(),
                body: tracker.open_tickets()[0].body.clone(),
                labels: tracker.open_tickets()[0].labels.clone(),
                assignees: Default::default(),
                identity: None,
            },
        )
        .unwrap();

    let mut p = params(tmp.path());
    p.trigger = SyncTrigger::push(Some(vec![PathBuf::from("src/main.rs")]));
    let summary = run(&p, &tracker).unwrap();
    assert!(summary.is_noop(), "{summary:?}");

    // A full resync repairs the drift.
    let summary = run(&params(tmp.path()), &tracker).unwrap();
    assert_eq!(summary.tickets_updated, 1);
    assert_eq!(tracker.open_tickets()[0].title, "add retry logic");
}
