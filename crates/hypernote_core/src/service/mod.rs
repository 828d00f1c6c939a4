//! Notebook-level use cases.
//!
//! # Responsibility
//! - Combine note creation, the note registry, and the relation store into
//!   the operations a front end drives.

pub mod notebook;
