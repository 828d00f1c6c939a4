//! Core persistence and retrieval engine for HyperNote notebooks.
//! Notes, relations, and their on-disk encoding live here; front ends only
//! gather field values and render results.

pub mod autofill;
pub mod codec;
pub mod config;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;

pub use autofill::{AutofillSource, SystemAutofill};
pub use codec::{CodecError, CodecResult, TypeTag, Value};
pub use config::RegistryLocation;
pub use logging::{default_log_level, init_logging, log_dir_from_env, logging_status};
pub use model::creation::{
    create_note, CreationContext, CreationError, CreationStatus, Draft, LinkResolver, RawValues,
};
pub use model::linked_text::{Link, LinkedText, Pos};
pub use model::note::{ActionNote, DataNote, Note, NoteId, NoteKind, ToolNote};
pub use model::part::{AUTOFILL, AUTOFILL_CONFIRM};
pub use model::relation::{Relation, RelationRole};
pub use model::timestamp::Timestamp;
pub use registry::note_registry::NoteRegistry;
pub use registry::relation_store::{RelationQuery, RelationStore};
pub use registry::{RegistryError, RegistryResult};
pub use service::notebook::{Notebook, NotebookError, Registered};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
