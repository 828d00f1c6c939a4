//! Domain model for notebook notes and relations.
//!
//! # Responsibility
//! - Define note variants, their declared parts, and linked text values.
//! - Own the validating note creation path.
//!
//! # Invariants
//! - Every note is identified by a registry-unique `NoteId`.
//! - Notes and linked text are immutable once built.

pub mod creation;
pub mod linked_text;
pub mod note;
pub mod part;
pub mod relation;
pub mod timestamp;
