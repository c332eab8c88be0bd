//! # stitch-core
//!
//! Domain types, content-based identity hashing, and the markdown document
//! store shared by every stitch crate.
//!
//! The document store owns the on-disk representation of work items
//! (`.github/issues/*.md` by convention); the identity module derives the
//! stable join key used to match an item across source annotations, documents,
//! and tracker tickets.

pub mod docstore;
pub mod error;
pub mod identity;
pub mod types;

pub use error::StoreError;
pub use identity::Identity;
pub use types::{
    Annotation, Document, FrontMatter, NewTicket, Ticket, TicketPatch, TicketState,
};
