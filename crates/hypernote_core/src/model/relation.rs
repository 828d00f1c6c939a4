//! Typed relations between two notes.

use crate::model::note::NoteId;
use serde::Serialize;

/// Role one note plays in a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationRole {
    Used,
    UsedBy,
    Created,
    CreatedBy,
    Before,
    After,
}

impl RelationRole {
    /// Stable integer code stored in the relation file.
    pub fn code(self) -> i32 {
        match self {
            Self::Used => 0,
            Self::UsedBy => 1,
            Self::Created => 2,
            Self::CreatedBy => 3,
            Self::Before => 4,
            Self::After => 5,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Used),
            1 => Some(Self::UsedBy),
            2 => Some(Self::Created),
            3 => Some(Self::CreatedBy),
            4 => Some(Self::Before),
            5 => Some(Self::After),
            _ => None,
        }
    }

    /// The role the other side of the relation plays.
    pub fn inverse(self) -> Self {
        match self {
            Self::Used => Self::UsedBy,
            Self::UsedBy => Self::Used,
            Self::Created => Self::CreatedBy,
            Self::CreatedBy => Self::Created,
            Self::Before => Self::After,
            Self::After => Self::Before,
        }
    }
}

/// Append-only fact linking two notes, each with its role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub uid_a: NoteId,
    pub uid_b: NoteId,
    pub role_a: RelationRole,
    pub role_b: RelationRole,
}

impl Relation {
    pub fn new(uid_a: NoteId, uid_b: NoteId, role_a: RelationRole, role_b: RelationRole) -> Self {
        Self {
            uid_a,
            uid_b,
            role_a,
            role_b,
        }
    }

    /// Relation where `uid_b` plays the inverse of `role_a`.
    pub fn paired(uid_a: NoteId, role_a: RelationRole, uid_b: NoteId) -> Self {
        Self::new(uid_a, uid_b, role_a, role_a.inverse())
    }

    pub fn involves(&self, uid: NoteId) -> bool {
        self.uid_a == uid || self.uid_b == uid
    }
}
