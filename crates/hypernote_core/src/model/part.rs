//! Declarative field descriptors ("parts") for every note kind.
//!
//! # Invariants
//! - Table order is the field order used by note construction and by the
//!   note codecs.
//! - `searchable` parts hold plain or linked text, never timestamps.

use crate::model::creation::{
    autolink_text, normalize_path, parse_timestamp, raw_string, PartContext,
};
use crate::model::linked_text::LinkedText;
use crate::model::timestamp::Timestamp;

/// Raw value requesting autofill of a safe field.
pub const AUTOFILL: &str = "";
/// Raw value explicitly requesting autofill of an unsafe field.
pub const AUTOFILL_CONFIRM: &str = "@@";

/// Stored value produced by a part loader.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Linked(LinkedText),
    Time(Timestamp),
}

/// Turns one raw input string into a stored field value.
///
/// Errors are human-readable reasons; the caller attaches the field name.
pub type PartLoader = fn(&str, &mut PartContext<'_>) -> Result<FieldValue, String>;

/// One declared field of a note kind.
#[derive(Clone, Copy)]
pub struct PartSpec {
    pub name: &'static str,
    pub display_name: &'static str,
    pub loader: PartLoader,
    /// Absence is a hard creation failure.
    pub required: bool,
    /// Indexed for search and unique across the registry.
    pub searchable: bool,
    /// Only autofilled on `AUTOFILL_CONFIRM`; result needs confirmation.
    pub unsafe_autofill: bool,
}

impl std::fmt::Debug for PartSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartSpec")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("searchable", &self.searchable)
            .field("unsafe_autofill", &self.unsafe_autofill)
            .finish_non_exhaustive()
    }
}

const fn part(name: &'static str, display_name: &'static str, loader: PartLoader) -> PartSpec {
    PartSpec {
        name,
        display_name,
        loader,
        required: false,
        searchable: false,
        unsafe_autofill: false,
    }
}

const fn required(spec: PartSpec) -> PartSpec {
    PartSpec {
        required: true,
        ..spec
    }
}

const fn searchable(spec: PartSpec) -> PartSpec {
    PartSpec {
        searchable: true,
        ..spec
    }
}

const fn unsafe_autofill(spec: PartSpec) -> PartSpec {
    PartSpec {
        unsafe_autofill: true,
        ..spec
    }
}

pub const TOOL_PARTS: &[PartSpec] = &[
    searchable(part("name", "Name", raw_string)),
    required(searchable(part("cmd", "Command", raw_string))),
    unsafe_autofill(part("ver", "Version", raw_string)),
    part("desc", "Description", autolink_text),
];

pub const ACTION_PARTS: &[PartSpec] = &[
    required(part("shellcmd", "Shell command", autolink_text)),
    part("toolcmd", "Tool", autolink_text),
    part("time", "Time", parse_timestamp),
    part("desc", "Description", autolink_text),
];

pub const DATA_PARTS: &[PartSpec] = &[
    searchable(part("name", "Name", raw_string)),
    required(searchable(part("path", "Path", normalize_path))),
    part("src", "Source", autolink_text),
    part("desc", "Description", autolink_text),
];

/// Finds a part descriptor by name.
pub fn find_part(parts: &'static [PartSpec], name: &str) -> Option<&'static PartSpec> {
    parts.iter().find(|part| part.name == name)
}

#[cfg(test)]
mod tests {
    use super::{find_part, ACTION_PARTS, DATA_PARTS, TOOL_PARTS};

    #[test]
    fn flags_match_note_kinds() {
        let ver = find_part(TOOL_PARTS, "ver").unwrap();
        assert!(ver.unsafe_autofill && !ver.required && !ver.searchable);

        let cmd = find_part(TOOL_PARTS, "cmd").unwrap();
        assert!(cmd.required && cmd.searchable);

        assert!(ACTION_PARTS.iter().all(|part| !part.searchable));
        assert!(find_part(DATA_PARTS, "path").unwrap().required);
        assert!(find_part(DATA_PARTS, "missing").is_none());
    }
}
