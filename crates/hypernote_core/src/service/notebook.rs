//! Notebook use-case service.
//!
//! # Responsibility
//! - Tie one note registry and one relation store to their files.
//! - Draft notes against the registry (autolinks, path base) and register
//!   them once the caller accepts the draft.
//!
//! # Invariants
//! - Nothing reaches disk until `save`.
//! - A draft's uid is free at drafting time; `register` still rejects it if
//!   another note took the uid in between.

use crate::autofill::AutofillSource;
use crate::config::RegistryLocation;
use crate::model::creation::{
    create_note, CreationContext, CreationError, CreationStatus, Draft, RawValues,
};
use crate::model::note::{Note, NoteId, NoteKind};
use crate::model::relation::Relation;
use crate::registry::note_registry::NoteRegistry;
use crate::registry::relation_store::{RelationQuery, RelationStore};
use crate::registry::{RegistryError, RegistryResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Error for combined create-and-register calls.
#[derive(Debug)]
pub enum NotebookError {
    Creation(CreationError),
    Registry(RegistryError),
}

impl Display for NotebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Creation(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
        }
    }
}

impl Error for NotebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Creation(err) => Some(err),
            Self::Registry(err) => Some(err),
        }
    }
}

impl From<CreationError> for NotebookError {
    fn from(value: CreationError) -> Self {
        Self::Creation(value)
    }
}

impl From<RegistryError> for NotebookError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

/// Outcome of a successful `create_and_register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registered {
    pub uid: NoteId,
    /// Unsure autofills and autolinks the caller may want to show.
    pub status: CreationStatus,
}

/// Loaded notebook: notes, relations, and where they are stored.
#[derive(Debug, Clone)]
pub struct Notebook {
    location: Option<RegistryLocation>,
    notes: NoteRegistry,
    relations: RelationStore,
    cwd: PathBuf,
}

impl Notebook {
    /// Loads both stores of `location`.
    pub fn open(location: RegistryLocation, cwd: impl Into<PathBuf>) -> RegistryResult<Self> {
        let notes = NoteRegistry::load(Some(&location.registry_path))?;
        let relations = RelationStore::load(Some(&location.relations_path))?;
        info!(
            "event=notebook_open module=service status=ok notes={} relations={}",
            notes.len(),
            relations.len()
        );
        Ok(Self {
            location: Some(location),
            notes,
            relations,
            cwd: cwd.into(),
        })
    }

    /// Empty notebook with no backing files; `save` does nothing.
    pub fn in_memory(cwd: impl Into<PathBuf>) -> Self {
        Self {
            location: None,
            notes: NoteRegistry::new(),
            relations: RelationStore::new(),
            cwd: cwd.into(),
        }
    }

    /// Builds a note with a fresh uid without registering it.
    pub fn draft(
        &self,
        kind: NoteKind,
        raw: &RawValues,
        source: &dyn AutofillSource,
    ) -> Result<Draft, CreationError> {
        let ctx = CreationContext {
            resolver: &self.notes,
            autofill: source,
            base_dir: self.base_dir(),
            cwd: &self.cwd,
        };
        create_note(kind, self.notes.gen_uid(), raw, &ctx)
    }

    /// Adds an accepted draft to the registry.
    pub fn register(&mut self, draft: Draft) -> RegistryResult<NoteId> {
        let (note, _) = draft.into_parts();
        self.notes.add(note)
    }

    /// Drafts and registers in one step, for callers that skip confirmation.
    pub fn create_and_register(
        &mut self,
        kind: NoteKind,
        raw: &RawValues,
        source: &dyn AutofillSource,
    ) -> Result<Registered, NotebookError> {
        let draft = self.draft(kind, raw, source).map_err(|err| {
            warn!(
                "event=note_create module=service status=error kind={} error={}",
                kind.label(),
                err
            );
            err
        })?;
        let (note, status) = draft.into_parts();
        let uid = self.notes.add(note)?;
        info!(
            "event=note_create module=service status=ok kind={} uid={} unsure_fields={} autolinks={}",
            kind.label(),
            uid,
            status.unsure_fields.len(),
            status.autolinked_words.len()
        );
        Ok(Registered { uid, status })
    }

    pub fn lookup(&self, uid: NoteId) -> RegistryResult<&Note> {
        self.notes.get(uid)
    }

    pub fn search(&self, text: &str) -> Vec<NoteId> {
        self.notes.search(text)
    }

    pub fn relate(&mut self, relation: Relation) {
        self.relations.add(relation);
    }

    pub fn relations(&self, query: RelationQuery) -> Vec<Relation> {
        self.relations.get(query).copied().collect()
    }

    /// Writes both stores to their files.
    pub fn save(&self) -> RegistryResult<()> {
        let Some(location) = &self.location else {
            return Ok(());
        };
        self.notes.save(Some(&location.registry_path))?;
        self.relations.save(Some(&location.relations_path))
    }

    pub fn location(&self) -> Option<&RegistryLocation> {
        self.location.as_ref()
    }

    pub fn notes(&self) -> &NoteRegistry {
        &self.notes
    }

    pub fn relation_store(&self) -> &RelationStore {
        &self.relations
    }

    fn base_dir(&self) -> &Path {
        self.location
            .as_ref()
            .map(|location| location.base_dir.as_path())
            .unwrap_or(&self.cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::Notebook;
    use crate::autofill::AutofillSource;
    use crate::model::creation::RawValues;
    use crate::model::note::NoteKind;
    use crate::registry::RegistryError;
    use crate::service::notebook::NotebookError;

    struct Fixed;

    impl AutofillSource for Fixed {
        fn detect_version(&self, _cmd: &str) -> Option<String> {
            None
        }

        fn timestamp(&self) -> String {
            "2020-01-02T03:04:05Z".into()
        }
    }

    fn raw(pairs: &[(&str, &str)]) -> RawValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn draft_is_not_registered_until_accepted() {
        let mut notebook = Notebook::in_memory("/work");
        let draft = notebook
            .draft(NoteKind::Tool, &raw(&[("cmd", "bwa")]), &Fixed)
            .unwrap();
        assert!(notebook.search("bwa").is_empty());

        let uid = notebook.register(draft).unwrap();
        assert_eq!(notebook.search("bwa"), vec![uid]);
    }

    #[test]
    fn duplicate_cmd_is_a_registry_error() {
        let mut notebook = Notebook::in_memory("/work");
        notebook
            .create_and_register(NoteKind::Tool, &raw(&[("cmd", "bwa")]), &Fixed)
            .unwrap();
        let err = notebook
            .create_and_register(NoteKind::Tool, &raw(&[("cmd", "BWA")]), &Fixed)
            .unwrap_err();
        assert!(matches!(
            err,
            NotebookError::Registry(RegistryError::DuplicateSearchable { .. })
        ));
        assert_eq!(notebook.notes().len(), 1);
    }
}
