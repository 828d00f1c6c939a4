//! Denormalized index over searchable note fields.
//!
//! # Invariants
//! - One entry per non-empty searchable field per indexed note.
//! - Entries keep insertion order; lookups report first-seen order.

use crate::model::note::NoteId;

/// One indexed field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub field: &'static str,
    pub text: String,
    pub uid: NoteId,
    folded: String,
}

impl SearchEntry {
    fn new(field: &'static str, text: &str, uid: NoteId) -> Self {
        Self {
            field,
            text: text.to_string(),
            uid,
            folded: fold(text),
        }
    }
}

/// Case-insensitive exact-match index.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    entries: Vec<SearchEntry>,
}

impl SearchIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub(crate) fn push(&mut self, field: &'static str, text: &str, uid: NoteId) {
        self.entries.push(SearchEntry::new(field, text, uid));
    }

    /// First entry whose text equals `text`, ignoring case.
    pub fn first_match(&self, text: &str) -> Option<&SearchEntry> {
        let folded = fold(text);
        self.entries.iter().find(|entry| entry.folded == folded)
    }

    /// Distinct ids whose indexed text equals `query`, ignoring case.
    pub fn lookup(&self, query: &str) -> Vec<NoteId> {
        let folded = fold(query);
        let mut uids = Vec::new();
        for entry in self.entries.iter().filter(|entry| entry.folded == folded) {
            if !uids.contains(&entry.uid) {
                uids.push(entry.uid);
            }
        }
        uids
    }
}

fn fold(text: &str) -> String {
    text.to_lowercase()
}
