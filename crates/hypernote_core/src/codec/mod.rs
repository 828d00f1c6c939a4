//! Versioned, self-describing binary encoding for registry values.
//!
//! # Responsibility
//! - Map `(type tag, format version)` pairs to pure encode/decode functions.
//! - Frame every value with the shared tag + version header.
//!
//! # Invariants
//! - `decode(encode(v)) == v` for every encodable type and version.
//! - Decoding dispatches only on the bytes read; an unregistered
//!   `(tag, version)` pair is `UnknownFormat`, never a fallback.
//! - Encoding always uses the newest registered version for a type.
//!
//! # See also
//! - `wire` for the byte-level layout.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod table;
mod value;
pub mod wire;

pub use table::{
    decode, decode_all, decode_prefix, encode, encode_into, latest_version, registered_formats,
};
pub use value::{TypeTag, Value, ValueRef};
pub use wire::WireReader;

pub type CodecResult<T> = Result<T, CodecError>;

/// Encoding/decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// No decoder is registered for this `(tag, version)` pair.
    UnknownFormat { tag: u8, version: i32 },
    UnexpectedEof { offset: usize, needed: usize },
    InvalidUtf8 { offset: usize },
    /// Well-framed bytes carrying an impossible value.
    InvalidValue { offset: usize, message: String },
    /// A nested value had a different type than its slot requires.
    TypeMismatch { expected: TypeTag, found: u8 },
    /// The value cannot be represented in the current format.
    UnencodableValue(String),
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownFormat { tag, version } => write!(
                f,
                "unknown format: no decoder for tag {} version {version}",
                describe_tag(*tag)
            ),
            Self::UnexpectedEof { offset, needed } => write!(
                f,
                "unexpected end of data at offset {offset}, need {needed} bytes"
            ),
            Self::InvalidUtf8 { offset } => write!(f, "invalid UTF-8 text at offset {offset}"),
            Self::InvalidValue { offset, message } => {
                write!(f, "invalid value at offset {offset}: {message}")
            }
            Self::TypeMismatch { expected, found } => write!(
                f,
                "expected {} value, found tag {}",
                expected.name(),
                describe_tag(*found)
            ),
            Self::UnencodableValue(message) => write!(f, "cannot encode value: {message}"),
        }
    }
}

impl Error for CodecError {}

fn describe_tag(tag: u8) -> String {
    if tag.is_ascii_graphic() {
        format!("`{}`", tag as char)
    } else {
        format!("0x{tag:02x}")
    }
}
