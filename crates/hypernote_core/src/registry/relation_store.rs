//! Append-only store of relations between note identifiers.
//!
//! # Invariants
//! - `add` never deduplicates; the same fact may be recorded twice.
//! - Relations hold ids only and are not checked against the note registry.

use super::persist::{read_file, write_file};
use super::{RegistryError, RegistryResult};
use crate::codec::{self, Value};
use crate::model::note::NoteId;
use crate::model::relation::Relation;
use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Relation filter by endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationQuery {
    /// Relations naming this id on either side.
    One(NoteId),
    /// Relations naming both ids, in either order. `Both(a, a)` is every
    /// relation naming `a`.
    Both(NoteId, NoteId),
}

impl RelationQuery {
    pub fn matches(&self, relation: &Relation) -> bool {
        match *self {
            Self::One(uid) => relation.involves(uid),
            Self::Both(a, b) => relation.involves(a) && relation.involves(b),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    relations: Vec<Relation>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a relation file; `None` or a missing file yields an empty store.
    pub fn load(path: Option<&Path>) -> RegistryResult<Self> {
        let Some(path) = path else {
            return Ok(Self::new());
        };
        let started_at = Instant::now();
        let Some(bytes) = read_file(path)? else {
            info!("event=relations_load module=registry status=ok relations=0 missing_file=true");
            return Ok(Self::new());
        };

        match Self::from_bytes(&bytes) {
            Ok(store) => {
                info!(
                    "event=relations_load module=registry status=ok relations={} bytes={} duration_ms={}",
                    store.len(),
                    bytes.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(store)
            }
            Err(err) => {
                error!(
                    "event=relations_load module=registry status=error bytes={} error={}",
                    bytes.len(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> RegistryResult<Self> {
        let relations = codec::decode_all(bytes)?
            .into_iter()
            .map(|value| match value {
                Value::Relation(relation) => Ok(relation),
                other => Err(RegistryError::UnexpectedRecord {
                    expected: "relation",
                    found: other.type_tag(),
                }),
            })
            .collect::<RegistryResult<Vec<_>>>()?;
        Ok(Self { relations })
    }

    pub fn to_bytes(&self) -> RegistryResult<Vec<u8>> {
        let mut buf = Vec::new();
        for relation in &self.relations {
            codec::encode_into(relation, &mut buf)?;
        }
        Ok(buf)
    }

    /// Writes the relation file. `None` is a no-op.
    pub fn save(&self, path: Option<&Path>) -> RegistryResult<()> {
        let Some(path) = path else {
            return Ok(());
        };
        let result = self
            .to_bytes()
            .and_then(|bytes| write_file(path, &bytes).map(|()| bytes.len()));
        match result {
            Ok(size) => {
                info!(
                    "event=relations_save module=registry status=ok relations={} bytes={}",
                    self.len(),
                    size
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=relations_save module=registry status=error relations={} error={}",
                    self.len(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn add(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    /// Relations matching `query`, in insertion order. Linear scan.
    pub fn get(&self, query: RelationQuery) -> impl Iterator<Item = &Relation> + '_ {
        self.relations
            .iter()
            .filter(move |relation| query.matches(relation))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relation> {
        self.relations.iter()
    }
}
