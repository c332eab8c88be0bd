//! # stitch-sync
//!
//! The three-way reconciler: given the current annotations, documents, and
//! open tickets, [`reconcile::plan`] computes the ordered set of actions that
//! converges the three stores, and [`executor::execute`] applies them with
//! batched version-control side effects.
//!
//! Call [`pipeline::run`] for a full scan → reconcile → execute → commit run,
//! or [`pipeline::run_scan`] for the documents-only variant used on pull
//! requests.

pub mod error;
pub mod executor;
pub mod git;
pub mod pipeline;
pub mod reconcile;

pub use error::SyncError;
pub use executor::{execute, RunSummary};
pub use reconcile::{Action, EventKind, Plan, SyncTrigger};
