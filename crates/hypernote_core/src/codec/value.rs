//! Values the codec table knows how to encode and decode.

use crate::model::linked_text::LinkedText;
use crate::model::note::{Note, NoteKind};
use crate::model::relation::Relation;
use crate::model::timestamp::Timestamp;

/// Logical type of an encoded value; stored as a one-byte ASCII tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Int,
    Float,
    Str,
    Timestamp,
    LinkedText,
    ToolNote,
    ActionNote,
    DataNote,
    Relation,
}

impl TypeTag {
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Int => b'i',
            Self::Float => b'f',
            Self::Str => b's',
            Self::Timestamp => b't',
            Self::LinkedText => b'L',
            Self::ToolNote => b'T',
            Self::ActionNote => b'A',
            Self::DataNote => b'D',
            Self::Relation => b'R',
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'i' => Some(Self::Int),
            b'f' => Some(Self::Float),
            b's' => Some(Self::Str),
            b't' => Some(Self::Timestamp),
            b'L' => Some(Self::LinkedText),
            b'T' => Some(Self::ToolNote),
            b'A' => Some(Self::ActionNote),
            b'D' => Some(Self::DataNote),
            b'R' => Some(Self::Relation),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "string",
            Self::Timestamp => "timestamp",
            Self::LinkedText => "linked text",
            Self::ToolNote => "tool note",
            Self::ActionNote => "action note",
            Self::DataNote => "data note",
            Self::Relation => "relation",
        }
    }

    fn of_note(kind: NoteKind) -> Self {
        match kind {
            NoteKind::Tool => Self::ToolNote,
            NoteKind::Action => Self::ActionNote,
            NoteKind::Data => Self::DataNote,
        }
    }
}

/// Owned decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Str(String),
    Timestamp(Timestamp),
    LinkedText(LinkedText),
    Note(Note),
    Relation(Relation),
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        self.as_value_ref().type_tag()
    }

    pub fn as_value_ref(&self) -> ValueRef<'_> {
        match self {
            Self::Int(value) => ValueRef::Int(*value),
            Self::Float(value) => ValueRef::Float(*value),
            Self::Str(value) => ValueRef::Str(value),
            Self::Timestamp(value) => ValueRef::Timestamp(*value),
            Self::LinkedText(value) => ValueRef::LinkedText(value),
            Self::Note(value) => ValueRef::Note(value),
            Self::Relation(value) => ValueRef::Relation(value),
        }
    }
}

/// Borrowed value handed to encoders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Int(i32),
    Float(f32),
    Str(&'a str),
    Timestamp(Timestamp),
    LinkedText(&'a LinkedText),
    Note(&'a Note),
    Relation(&'a Relation),
}

impl ValueRef<'_> {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Str(_) => TypeTag::Str,
            Self::Timestamp(_) => TypeTag::Timestamp,
            Self::LinkedText(_) => TypeTag::LinkedText,
            Self::Note(note) => TypeTag::of_note(note.kind()),
            Self::Relation(_) => TypeTag::Relation,
        }
    }
}

impl<'a> From<&'a Note> for ValueRef<'a> {
    fn from(value: &'a Note) -> Self {
        Self::Note(value)
    }
}

impl<'a> From<&'a Relation> for ValueRef<'a> {
    fn from(value: &'a Relation) -> Self {
        Self::Relation(value)
    }
}

impl<'a> From<&'a LinkedText> for ValueRef<'a> {
    fn from(value: &'a LinkedText) -> Self {
        Self::LinkedText(value)
    }
}

impl<'a> From<&'a str> for ValueRef<'a> {
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl From<i32> for ValueRef<'_> {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for ValueRef<'_> {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Timestamp> for ValueRef<'_> {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}
