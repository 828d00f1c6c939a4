//! Note variants held by the registry.
//!
//! # Responsibility
//! - Define the closed set of note kinds and their typed fields.
//! - Expose field lookup by part name for indexing and display.
//!
//! # Invariants
//! - Notes are only built through the validating creation path
//!   (`model::creation`) or the trusted decode path (`codec`); both live in
//!   this crate, so callers can never hand-assemble an unchecked note.
//! - Field order of every variant matches its part descriptor table.

use crate::model::linked_text::LinkedText;
use crate::model::part::{self, PartSpec};
use crate::model::timestamp::Timestamp;
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Registry-unique note identifier in `0..=i32::MAX`.
pub type NoteId = i32;

/// Id carried by notes decoded from formats that predate stored ids.
pub const UNASSIGNED_ID: NoteId = -1;

/// Note variant discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    /// A command-line tool.
    Tool,
    /// A shell command that was run.
    Action,
    /// A data file.
    Data,
}

impl NoteKind {
    /// Ordered part descriptors for this kind.
    pub fn parts(self) -> &'static [PartSpec] {
        match self {
            Self::Tool => part::TOOL_PARTS,
            Self::Action => part::ACTION_PARTS,
            Self::Data => part::DATA_PARTS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tool => "Tool",
            Self::Action => "Action",
            Self::Data => "Data",
        }
    }
}

/// A tool and how to invoke it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolNote {
    uid: NoteId,
    name: String,
    cmd: String,
    ver: String,
    desc: LinkedText,
}

impl ToolNote {
    pub(crate) fn from_parts(
        uid: NoteId,
        name: String,
        cmd: String,
        ver: String,
        desc: LinkedText,
    ) -> Self {
        Self {
            uid,
            name,
            cmd,
            ver,
            desc,
        }
    }

    pub fn uid(&self) -> NoteId {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    /// Tool version; empty when never provided.
    pub fn ver(&self) -> &str {
        &self.ver
    }

    pub fn desc(&self) -> &LinkedText {
        &self.desc
    }
}

/// A shell command run with some tool at some time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionNote {
    uid: NoteId,
    shellcmd: LinkedText,
    toolcmd: LinkedText,
    time: Timestamp,
    desc: LinkedText,
}

impl ActionNote {
    pub(crate) fn from_parts(
        uid: NoteId,
        shellcmd: LinkedText,
        toolcmd: LinkedText,
        time: Timestamp,
        desc: LinkedText,
    ) -> Self {
        Self {
            uid,
            shellcmd,
            toolcmd,
            time,
            desc,
        }
    }

    pub fn uid(&self) -> NoteId {
        self.uid
    }

    pub fn shellcmd(&self) -> &LinkedText {
        &self.shellcmd
    }

    pub fn toolcmd(&self) -> &LinkedText {
        &self.toolcmd
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn desc(&self) -> &LinkedText {
        &self.desc
    }
}

/// A data file and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataNote {
    uid: NoteId,
    name: String,
    path: String,
    src: LinkedText,
    desc: LinkedText,
}

impl DataNote {
    pub(crate) fn from_parts(
        uid: NoteId,
        name: String,
        path: String,
        src: LinkedText,
        desc: LinkedText,
    ) -> Self {
        Self {
            uid,
            name,
            path,
            src,
            desc,
        }
    }

    pub fn uid(&self) -> NoteId {
        self.uid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Normalized path: relative to the notebook base directory when inside
    /// it, absolute otherwise.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn src(&self) -> &LinkedText {
        &self.src
    }

    pub fn desc(&self) -> &LinkedText {
        &self.desc
    }
}

/// Borrowed view of one note field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Text(&'a str),
    Linked(&'a LinkedText),
    Time(Timestamp),
}

impl<'a> FieldRef<'a> {
    /// Plain text of the field; `None` for timestamps.
    pub fn as_text(self) -> Option<&'a str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Linked(linked) => Some(linked.text()),
            Self::Time(_) => None,
        }
    }
}

/// Any note held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Note {
    Tool(ToolNote),
    Action(ActionNote),
    Data(DataNote),
}

impl Note {
    pub fn kind(&self) -> NoteKind {
        match self {
            Self::Tool(_) => NoteKind::Tool,
            Self::Action(_) => NoteKind::Action,
            Self::Data(_) => NoteKind::Data,
        }
    }

    pub fn uid(&self) -> NoteId {
        match self {
            Self::Tool(note) => note.uid,
            Self::Action(note) => note.uid,
            Self::Data(note) => note.uid,
        }
    }

    pub(crate) fn set_uid(&mut self, uid: NoteId) {
        match self {
            Self::Tool(note) => note.uid = uid,
            Self::Action(note) => note.uid = uid,
            Self::Data(note) => note.uid = uid,
        }
    }

    /// Looks up a field by its part name.
    pub fn field(&self, name: &str) -> Option<FieldRef<'_>> {
        let value = match (self, name) {
            (Self::Tool(n), "name") => FieldRef::Text(&n.name),
            (Self::Tool(n), "cmd") => FieldRef::Text(&n.cmd),
            (Self::Tool(n), "ver") => FieldRef::Text(&n.ver),
            (Self::Tool(n), "desc") => FieldRef::Linked(&n.desc),
            (Self::Action(n), "shellcmd") => FieldRef::Linked(&n.shellcmd),
            (Self::Action(n), "toolcmd") => FieldRef::Linked(&n.toolcmd),
            (Self::Action(n), "time") => FieldRef::Time(n.time),
            (Self::Action(n), "desc") => FieldRef::Linked(&n.desc),
            (Self::Data(n), "name") => FieldRef::Text(&n.name),
            (Self::Data(n), "path") => FieldRef::Text(&n.path),
            (Self::Data(n), "src") => FieldRef::Linked(&n.src),
            (Self::Data(n), "desc") => FieldRef::Linked(&n.desc),
            _ => return None,
        };
        Some(value)
    }

    /// `(part name, text)` for every searchable part, in declared order.
    pub fn searchable_fields(&self) -> Vec<(&'static str, &str)> {
        self.kind()
            .parts()
            .iter()
            .filter(|part| part.searchable)
            .filter_map(|part| {
                self.field(part.name)
                    .and_then(|field| field.as_text())
                    .map(|text| (part.name, text))
            })
            .collect()
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tool(note) => write!(f, "Tool '{}'", note.name),
            Self::Data(note) => write!(f, "Data '{}'", note.name),
            Self::Action(note) => write!(
                f,
                "Action using '{}' at time '{}'",
                note.toolcmd.text(),
                note.time
            ),
        }
    }
}
