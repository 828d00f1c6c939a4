//! Validating construction of new notes from raw field values.
//!
//! # Responsibility
//! - Check required fields, run autofill, and produce stored field values
//!   through each part's loader.
//! - Report everything the caller must confirm (unsure autofills,
//!   autolinked words) in a `CreationStatus`.
//!
//! # Invariants
//! - A `Draft` only exists for a note whose creation fully succeeded.
//! - Failure never leaves a partially built note reachable by callers.
//! - Unsafe fields are only autofilled on `AUTOFILL_CONFIRM`.

use crate::autofill::AutofillSource;
use crate::model::linked_text::{Link, LinkedText, Pos};
use crate::model::note::{ActionNote, DataNote, Note, NoteId, NoteKind, ToolNote};
use crate::model::part::{FieldValue, PartSpec, AUTOFILL, AUTOFILL_CONFIRM};
use crate::model::timestamp::Timestamp;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};
use std::vec::IntoIter;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("valid word regex"));

/// Raw user input: part name to raw string.
pub type RawValues = HashMap<String, String>;

/// Resolves a word to the note it should link to.
pub trait LinkResolver {
    /// First note whose searchable text equals `word`, ignoring case.
    fn resolve(&self, word: &str) -> Option<NoteId>;
}

/// A word that was linked automatically and needs user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutolinkedWord {
    pub field: &'static str,
    pub word: String,
    pub dest: NoteId,
}

/// Outcome details of one note creation attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreationStatus {
    /// A required field was missing or blank.
    pub insufficient_info: bool,
    pub missing_fields: Vec<&'static str>,
    /// An explicitly requested unsafe autofill could not derive a value.
    pub autofill_failed: bool,
    pub failed_fields: Vec<&'static str>,
    /// Fields autofilled from unsafe sources; the caller must confirm them.
    pub unsure_fields: Vec<&'static str>,
    /// Words linked automatically, first occurrence per word.
    pub autolinked_words: Vec<AutolinkedWord>,
}

impl CreationStatus {
    /// Whether creation succeeded.
    pub fn is_ok(&self) -> bool {
        !self.insufficient_info && !self.autofill_failed
    }

    pub fn autofill_unsure(&self) -> bool {
        !self.unsure_fields.is_empty()
    }

    /// Whether anything was filled or linked that the user should confirm.
    pub fn needs_confirmation(&self) -> bool {
        self.autofill_unsure() || !self.autolinked_words.is_empty()
    }

    fn record_autolink(&mut self, field: &'static str, word: &str, dest: NoteId) {
        if self.autolinked_words.iter().any(|entry| entry.word == word) {
            return;
        }
        self.autolinked_words.push(AutolinkedWord {
            field,
            word: word.to_string(),
            dest,
        });
    }
}

impl Display for CreationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_ok() {
            return Ok(());
        }
        write!(f, "note creation error:")?;
        if self.insufficient_info {
            write!(
                f,
                " insufficient info (required fields omitted: {})",
                self.missing_fields.join(", ")
            )?;
        }
        if self.autofill_failed {
            if self.insufficient_info {
                write!(f, ";")?;
            }
            write!(f, " autofill failed ({})", self.failed_fields.join(", "))?;
        }
        Ok(())
    }
}

/// Note creation failure. No note survives a failed creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationError {
    InsufficientInfo(CreationStatus),
    AutofillFailed(CreationStatus),
    /// A part loader rejected its raw value.
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl CreationError {
    /// Creation status, when the failure came from status checks.
    pub fn status(&self) -> Option<&CreationStatus> {
        match self {
            Self::InsufficientInfo(status) | Self::AutofillFailed(status) => Some(status),
            Self::InvalidField { .. } => None,
        }
    }
}

impl Display for CreationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientInfo(status) | Self::AutofillFailed(status) => {
                write!(f, "{status}")
            }
            Self::InvalidField { field, message } => {
                write!(f, "invalid value for field `{field}`: {message}")
            }
        }
    }
}

impl Error for CreationError {}

/// Collaborators needed while building a note.
pub struct CreationContext<'a> {
    pub resolver: &'a dyn LinkResolver,
    pub autofill: &'a dyn AutofillSource,
    /// Directory relative to which in-notebook paths are stored.
    pub base_dir: &'a Path,
    /// Directory relative paths in raw input are resolved against.
    pub cwd: &'a Path,
}

/// State handed to part loaders.
pub struct PartContext<'a> {
    field: &'static str,
    resolver: &'a dyn LinkResolver,
    base_dir: &'a Path,
    cwd: &'a Path,
    status: &'a mut CreationStatus,
}

/// A successfully created note awaiting registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    note: Note,
    status: CreationStatus,
}

impl Draft {
    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn status(&self) -> &CreationStatus {
        &self.status
    }

    pub(crate) fn into_parts(self) -> (Note, CreationStatus) {
        (self.note, self.status)
    }
}

/// Builds a new note of `kind` with identifier `uid` from raw values.
///
/// Fields absent from `raw` count as `AUTOFILL`. Keys that name no part
/// are ignored.
///
/// # Errors
/// - `InsufficientInfo` when a required field is missing or blank.
/// - `AutofillFailed` when a confirmed unsafe autofill derives nothing.
/// - `InvalidField` when a loader rejects a value (e.g. bad timestamp).
pub fn create_note(
    kind: NoteKind,
    uid: NoteId,
    raw: &RawValues,
    ctx: &CreationContext<'_>,
) -> Result<Draft, CreationError> {
    let parts = kind.parts();
    let mut status = CreationStatus::default();
    let mut vals: BTreeMap<&'static str, String> = parts
        .iter()
        .map(|part| {
            let value = raw.get(part.name).cloned().unwrap_or_default();
            (part.name, value)
        })
        .collect();

    for part in parts.iter().filter(|part| part.required) {
        let value = value_of(&vals, part.name);
        if value.trim().is_empty() || value == AUTOFILL_CONFIRM {
            status.insufficient_info = true;
            status.missing_fields.push(part.name);
        }
    }
    if status.insufficient_info {
        debug!(
            "event=note_create module=model status=rejected kind={} reason=insufficient_info",
            kind.label()
        );
        return Err(CreationError::InsufficientInfo(status));
    }

    autofill(kind, parts, &mut vals, &mut status, ctx.autofill);
    if status.autofill_failed {
        debug!(
            "event=note_create module=model status=rejected kind={} reason=autofill_failed",
            kind.label()
        );
        return Err(CreationError::AutofillFailed(status));
    }

    let mut fields = Vec::with_capacity(parts.len());
    for part in parts {
        let raw_value = value_of(&vals, part.name);
        let mut part_ctx = PartContext {
            field: part.name,
            resolver: ctx.resolver,
            base_dir: ctx.base_dir,
            cwd: ctx.cwd,
            status: &mut status,
        };
        let value = (part.loader)(raw_value, &mut part_ctx).map_err(|message| {
            CreationError::InvalidField {
                field: part.name,
                message,
            }
        })?;
        fields.push(value);
    }

    let note = assemble(kind, uid, fields)?;
    debug!(
        "event=note_create module=model status=ok kind={} uid={} unsure={} autolinked={}",
        kind.label(),
        uid,
        status.unsure_fields.len(),
        status.autolinked_words.len()
    );
    Ok(Draft { note, status })
}

fn autofill(
    kind: NoteKind,
    parts: &'static [PartSpec],
    vals: &mut BTreeMap<&'static str, String>,
    status: &mut CreationStatus,
    source: &dyn AutofillSource,
) {
    for part in parts {
        let current = value_of(vals, part.name);
        let requested = if part.unsafe_autofill {
            current == AUTOFILL_CONFIRM
        } else {
            current == AUTOFILL || current == AUTOFILL_CONFIRM
        };
        if !requested {
            continue;
        }

        match derive_value(kind, part.name, vals, source) {
            Some(value) if !value.is_empty() => {
                if part.unsafe_autofill {
                    status.unsure_fields.push(part.name);
                }
                vals.insert(part.name, value);
            }
            _ if part.unsafe_autofill => {
                warn!(
                    "event=note_create module=model status=error kind={} field={} error_code=autofill_failed",
                    kind.label(),
                    part.name
                );
                status.autofill_failed = true;
                status.failed_fields.push(part.name);
            }
            _ => {
                vals.insert(part.name, String::new());
            }
        }
    }
}

fn derive_value(
    kind: NoteKind,
    field: &str,
    vals: &BTreeMap<&'static str, String>,
    source: &dyn AutofillSource,
) -> Option<String> {
    match (kind, field) {
        (NoteKind::Tool, "name") => Some(value_of(vals, "cmd").to_string()),
        (NoteKind::Tool, "ver") => source.detect_version(value_of(vals, "cmd")),
        (NoteKind::Action, "toolcmd") => value_of(vals, "shellcmd")
            .split(' ')
            .next()
            .map(str::to_string),
        (NoteKind::Action, "time") => Some(source.timestamp()),
        (NoteKind::Data, "name") => value_of(vals, "path")
            .rsplit('/')
            .next()
            .map(str::to_string),
        _ => None,
    }
}

fn value_of<'v>(vals: &'v BTreeMap<&'static str, String>, name: &str) -> &'v str {
    vals.get(name).map(String::as_str).unwrap_or(AUTOFILL)
}

fn assemble(kind: NoteKind, uid: NoteId, fields: Vec<FieldValue>) -> Result<Note, CreationError> {
    let mut fields = FieldCursor {
        parts: kind.parts(),
        index: 0,
        values: fields.into_iter(),
    };
    let note = match kind {
        NoteKind::Tool => Note::Tool(ToolNote::from_parts(
            uid,
            fields.text()?,
            fields.text()?,
            fields.text()?,
            fields.linked()?,
        )),
        NoteKind::Action => Note::Action(ActionNote::from_parts(
            uid,
            fields.linked()?,
            fields.linked()?,
            fields.time()?,
            fields.linked()?,
        )),
        NoteKind::Data => Note::Data(DataNote::from_parts(
            uid,
            fields.text()?,
            fields.text()?,
            fields.linked()?,
            fields.linked()?,
        )),
    };
    Ok(note)
}

struct FieldCursor {
    parts: &'static [PartSpec],
    index: usize,
    values: IntoIter<FieldValue>,
}

impl FieldCursor {
    fn next(&mut self) -> (&'static str, Option<FieldValue>) {
        let field = self
            .parts
            .get(self.index)
            .map_or("<unknown>", |part| part.name);
        self.index += 1;
        (field, self.values.next())
    }

    fn text(&mut self) -> Result<String, CreationError> {
        match self.next() {
            (_, Some(FieldValue::Text(text))) => Ok(text),
            (field, _) => Err(mismatch(field, "text")),
        }
    }

    fn linked(&mut self) -> Result<LinkedText, CreationError> {
        match self.next() {
            (_, Some(FieldValue::Linked(linked))) => Ok(linked),
            (field, _) => Err(mismatch(field, "linked text")),
        }
    }

    fn time(&mut self) -> Result<Timestamp, CreationError> {
        match self.next() {
            (_, Some(FieldValue::Time(time))) => Ok(time),
            (field, _) => Err(mismatch(field, "timestamp")),
        }
    }
}

fn mismatch(field: &'static str, expected: &str) -> CreationError {
    CreationError::InvalidField {
        field,
        message: format!("loader did not produce {expected}"),
    }
}

/// Stores the raw string unchanged.
pub(crate) fn raw_string(raw: &str, _ctx: &mut PartContext<'_>) -> Result<FieldValue, String> {
    Ok(FieldValue::Text(raw.to_string()))
}

/// Parses the raw string as a timestamp.
pub(crate) fn parse_timestamp(raw: &str, _ctx: &mut PartContext<'_>) -> Result<FieldValue, String> {
    Timestamp::parse(raw)
        .map(FieldValue::Time)
        .map_err(|err| err.to_string())
}

/// Stores paths inside the base directory relative to it, others absolute.
pub(crate) fn normalize_path(raw: &str, ctx: &mut PartContext<'_>) -> Result<FieldValue, String> {
    let absolute = lexical_normalize(&ctx.cwd.join(raw));
    let base = lexical_normalize(ctx.base_dir);
    let stored = match absolute.strip_prefix(&base) {
        Ok(relative) if relative.as_os_str().is_empty() => PathBuf::from("."),
        Ok(relative) => relative.to_path_buf(),
        Err(_) => absolute,
    };
    Ok(FieldValue::Text(stored.to_string_lossy().into_owned()))
}

/// Links every whitespace-delimited word that exactly names another note.
pub(crate) fn autolink_text(raw: &str, ctx: &mut PartContext<'_>) -> Result<FieldValue, String> {
    let mut links = Vec::new();
    for word in WORD_RE.find_iter(raw) {
        if let Some(dest) = ctx.resolver.resolve(word.as_str()) {
            links.push(Link::new(Pos::new(word.start(), word.end()), dest));
            ctx.status.record_autolink(ctx.field, word.as_str(), dest);
        }
    }
    LinkedText::new(raw, links)
        .map(FieldValue::Linked)
        .map_err(|err| err.to_string())
}

/// Resolves `.` and `..` components without touching the file system.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{lexical_normalize, normalize_path, CreationStatus, PartContext};
    use crate::model::creation::LinkResolver;
    use crate::model::note::NoteId;
    use crate::model::part::FieldValue;
    use std::path::{Path, PathBuf};

    struct NoLinks;

    impl LinkResolver for NoLinks {
        fn resolve(&self, _word: &str) -> Option<NoteId> {
            None
        }
    }

    fn normalized(raw: &str, base: &str, cwd: &str) -> String {
        let mut status = CreationStatus::default();
        let mut ctx = PartContext {
            field: "path",
            resolver: &NoLinks,
            base_dir: Path::new(base),
            cwd: Path::new(cwd),
            status: &mut status,
        };
        match normalize_path(raw, &mut ctx).unwrap() {
            FieldValue::Text(text) => text,
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn lexical_normalize_resolves_dots() {
        assert_eq!(
            lexical_normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
        assert_eq!(lexical_normalize(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn paths_inside_base_become_relative() {
        assert_eq!(normalized("data/x.csv", "/nb", "/nb"), "data/x.csv");
        assert_eq!(normalized("/nb/sub/../y.txt", "/nb", "/elsewhere"), "y.txt");
        assert_eq!(normalized("..", "/nb", "/nb/sub"), ".");
    }

    #[test]
    fn paths_outside_base_stay_absolute() {
        assert_eq!(normalized("/tmp/data/x.csv", "/nb", "/nb"), "/tmp/data/x.csv");
        assert_eq!(normalized("../other/z", "/nb", "/nb"), "/other/z");
    }

    #[test]
    fn failed_status_renders_reasons() {
        let status = CreationStatus {
            insufficient_info: true,
            missing_fields: vec!["cmd"],
            ..CreationStatus::default()
        };
        assert!(!status.is_ok());
        assert!(status.to_string().contains("cmd"));
        assert_eq!(CreationStatus::default().to_string(), "");
    }
}
