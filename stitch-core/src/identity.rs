//! Content-based identity derivation.
//!
//! An [`Identity`] is the stable join key that lets repeated runs recognise
//! "the same" work item across annotations, documents, and tickets. It is
//! content-addressed: any change to the defining fields (including whitespace
//! in the annotation text) yields a *new* identity, which downstream logic
//! treats as a new item rather than an edit.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of the truncated hex digest. Long enough that accidental collision
/// across a few hundred items is negligible.
pub const IDENTITY_LEN: usize = 16;

/// A 16-character lowercase hex identifier derived from an item's defining
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Identity of a source annotation: digest of `file:line:text`.
    ///
    /// The line number is part of the key, matching the annotation's location
    /// in the scanned tree at the time of the run.
    pub fn of_annotation(path: &Path, line: u32, text: &str) -> Self {
        Self::digest(&format!("{}:{}:{}", path.display(), line, text))
    }

    /// Identity of a manually authored document: digest of `title:body`.
    pub fn of_content(title: &str, body: &str) -> Self {
        Self::digest(&format!("{title}:{body}"))
    }

    /// Parse a previously derived identifier (e.g. from a filename or a
    /// ticket body marker). Accepts exactly [`IDENTITY_LEN`] lowercase hex
    /// characters.
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() == IDENTITY_LEN && s.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            Some(Self(s.to_owned()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(input: &str) -> Self {
        let mut h = Sha256::new();
        h.update(input.as_bytes());
        let hex = hex::encode(h.finalize());
        Self(hex[..IDENTITY_LEN].to_owned())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
