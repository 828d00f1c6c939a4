//! In-memory stores for notes and relations, persisted as codec records.
//!
//! # Responsibility
//! - Own the note set, its search index, and the relation list.
//! - Load/save each store from/to a single append-structured file.
//!
//! # Invariants
//! - Searchable field texts are unique across the registry, ignoring case.
//! - A failed insert or load leaves no partially applied state.
//! - Files are read once on load and rewritten whole on save; concurrent
//!   writers to one file are unsupported and the last save wins.

use crate::codec::{CodecError, TypeTag};
use crate::model::note::NoteId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub mod matcher;
pub mod note_registry;
mod persist;
pub mod relation_store;
pub mod search;

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Error for registry and relation store operations.
#[derive(Debug)]
pub enum RegistryError {
    /// A searchable field collides with an already indexed note.
    DuplicateSearchable {
        field: &'static str,
        text: String,
        existing: NoteId,
    },
    DuplicateId(NoteId),
    /// The note was never given an identifier.
    UnassignedId,
    NotFound(NoteId),
    /// A decoded record has a type this store does not hold.
    UnexpectedRecord {
        expected: &'static str,
        found: TypeTag,
    },
    Codec(CodecError),
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSearchable {
                field,
                text,
                existing,
            } => write!(
                f,
                "duplicate {field} `{text}`: already used by note {existing}"
            ),
            Self::DuplicateId(uid) => write!(f, "note id already registered: {uid}"),
            Self::UnassignedId => write!(f, "note has no assigned id"),
            Self::NotFound(uid) => write!(f, "note not found: {uid}"),
            Self::UnexpectedRecord { expected, found } => {
                write!(f, "expected {expected} record, found {}", found.name())
            }
            Self::Codec(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "I/O error on `{}`: {source}", path.display()),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Codec(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<CodecError> for RegistryError {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}
