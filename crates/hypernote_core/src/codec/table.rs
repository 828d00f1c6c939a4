//! Codec table and framed encode/decode entry points.
//!
//! Payload layouts (every nested value is itself framed):
//! ```text
//! i v1  [i32 LE]
//! f v1  [f32 LE]
//! s v1  [len: i][utf8 bytes: len]
//! t v1  [seconds since epoch: f32 LE]
//! L v1  [text: s][count: i] then count x [start: i][end: i][dest: i]
//! T v1  [uid: i][name: s][cmd: s][ver: s][desc: L]
//! A v1  [uid: i][shellcmd: L][toolcmd: L][time: t][desc: L]
//! D v1  [name: s][path: s][src: L][desc: L]          (decode only)
//! D v2  [uid: i][name: s][path: s][src: L][desc: L]
//! R v1  [uid_a: i][uid_b: i][role_a: i][role_b: i]
//! ```

use super::value::{TypeTag, Value, ValueRef};
use super::wire::{self, WireReader};
use super::{CodecError, CodecResult};
use crate::model::linked_text::{Link, LinkedText, Pos};
use crate::model::note::{ActionNote, DataNote, Note, NoteId, ToolNote, UNASSIGNED_ID};
use crate::model::relation::{Relation, RelationRole};
use crate::model::timestamp::Timestamp;
use once_cell::sync::Lazy;
use std::collections::HashMap;

type EncodeFn = fn(ValueRef<'_>, &mut Vec<u8>) -> CodecResult<()>;
type DecodeFn = fn(&mut WireReader<'_>) -> CodecResult<Value>;

#[derive(Clone, Copy)]
struct Codec {
    tag: TypeTag,
    version: i32,
    /// `None` for historical formats that are read but never written.
    encode: Option<EncodeFn>,
    decode: DecodeFn,
}

const CODECS: &[Codec] = &[
    Codec {
        tag: TypeTag::Int,
        version: 1,
        encode: Some(encode_int_v1),
        decode: decode_int_v1,
    },
    Codec {
        tag: TypeTag::Float,
        version: 1,
        encode: Some(encode_float_v1),
        decode: decode_float_v1,
    },
    Codec {
        tag: TypeTag::Str,
        version: 1,
        encode: Some(encode_str_v1),
        decode: decode_str_v1,
    },
    Codec {
        tag: TypeTag::Timestamp,
        version: 1,
        encode: Some(encode_timestamp_v1),
        decode: decode_timestamp_v1,
    },
    Codec {
        tag: TypeTag::LinkedText,
        version: 1,
        encode: Some(encode_linked_v1),
        decode: decode_linked_v1,
    },
    Codec {
        tag: TypeTag::ToolNote,
        version: 1,
        encode: Some(encode_tool_v1),
        decode: decode_tool_v1,
    },
    Codec {
        tag: TypeTag::ActionNote,
        version: 1,
        encode: Some(encode_action_v1),
        decode: decode_action_v1,
    },
    Codec {
        tag: TypeTag::DataNote,
        version: 1,
        encode: None,
        decode: decode_data_v1,
    },
    Codec {
        tag: TypeTag::DataNote,
        version: 2,
        encode: Some(encode_data_v2),
        decode: decode_data_v2,
    },
    Codec {
        tag: TypeTag::Relation,
        version: 1,
        encode: Some(encode_relation_v1),
        decode: decode_relation_v1,
    },
];

static DECODERS: Lazy<HashMap<(u8, i32), DecodeFn>> = Lazy::new(|| {
    CODECS
        .iter()
        .map(|codec| ((codec.tag.as_byte(), codec.version), codec.decode))
        .collect()
});

static ENCODERS: Lazy<HashMap<TypeTag, (i32, EncodeFn)>> = Lazy::new(|| {
    let mut encoders: HashMap<TypeTag, (i32, EncodeFn)> = HashMap::new();
    for codec in CODECS {
        let Some(encode) = codec.encode else {
            continue;
        };
        let newer = encoders
            .get(&codec.tag)
            .map_or(true, |(version, _)| codec.version > *version);
        if newer {
            encoders.insert(codec.tag, (codec.version, encode));
        }
    }
    encoders
});

/// Returns the version new values of `tag` are written with.
pub fn latest_version(tag: TypeTag) -> Option<i32> {
    ENCODERS.get(&tag).map(|(version, _)| *version)
}

/// Returns every decodable `(tag, version)` pair in table order.
pub fn registered_formats() -> Vec<(TypeTag, i32)> {
    CODECS
        .iter()
        .map(|codec| (codec.tag, codec.version))
        .collect()
}

/// Encodes one value, header included.
pub fn encode<'a>(value: impl Into<ValueRef<'a>>) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode_into(value, &mut buf)?;
    Ok(buf)
}

/// Appends one encoded value, header included, to `buf`. On error `buf`
/// is left as it was.
pub fn encode_into<'a>(value: impl Into<ValueRef<'a>>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let value = value.into();
    let tag = value.type_tag();
    let (version, encode_payload) = ENCODERS.get(&tag).copied().ok_or_else(|| {
        CodecError::UnencodableValue(format!("no encoder registered for {}", tag.name()))
    })?;
    let start = buf.len();
    wire::write_header(buf, tag.as_byte(), version);
    let result = encode_payload(value, buf);
    if result.is_err() {
        buf.truncate(start);
    }
    result
}

/// Decodes the next value, leaving `reader` at the following record.
pub fn decode(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let (tag, version) = reader.read_header()?;
    let decode_payload = lookup_decoder(tag, version)?;
    decode_payload(reader)
}

/// Decodes the value at the front of `bytes`; returns it with the number
/// of bytes consumed.
pub fn decode_prefix(bytes: &[u8]) -> CodecResult<(Value, usize)> {
    let mut reader = WireReader::new(bytes);
    let value = decode(&mut reader)?;
    Ok((value, reader.position()))
}

/// Decodes consecutive values until `bytes` is exhausted.
///
/// Any failure aborts the whole decode: records carry no length, so the
/// stream cannot be resynchronized past a bad record.
pub fn decode_all(bytes: &[u8]) -> CodecResult<Vec<Value>> {
    let mut reader = WireReader::new(bytes);
    let mut values = Vec::new();
    while !reader.is_empty() {
        values.push(decode(&mut reader)?);
    }
    Ok(values)
}

fn lookup_decoder(tag: u8, version: i32) -> CodecResult<DecodeFn> {
    DECODERS
        .get(&(tag, version))
        .copied()
        .ok_or(CodecError::UnknownFormat { tag, version })
}

/// Decodes a nested value, rejecting a wrong tag before dispatching.
fn decode_expected(reader: &mut WireReader<'_>, expected: TypeTag) -> CodecResult<Value> {
    let (tag, version) = reader.read_header()?;
    if tag != expected.as_byte() {
        return Err(CodecError::TypeMismatch {
            expected,
            found: tag,
        });
    }
    let decode_payload = lookup_decoder(tag, version)?;
    decode_payload(reader)
}

fn read_int(reader: &mut WireReader<'_>) -> CodecResult<i32> {
    match decode_expected(reader, TypeTag::Int)? {
        Value::Int(value) => Ok(value),
        other => Err(mismatch(TypeTag::Int, &other)),
    }
}

fn read_string(reader: &mut WireReader<'_>) -> CodecResult<String> {
    match decode_expected(reader, TypeTag::Str)? {
        Value::Str(value) => Ok(value),
        other => Err(mismatch(TypeTag::Str, &other)),
    }
}

fn read_timestamp(reader: &mut WireReader<'_>) -> CodecResult<Timestamp> {
    match decode_expected(reader, TypeTag::Timestamp)? {
        Value::Timestamp(value) => Ok(value),
        other => Err(mismatch(TypeTag::Timestamp, &other)),
    }
}

fn read_linked(reader: &mut WireReader<'_>) -> CodecResult<LinkedText> {
    match decode_expected(reader, TypeTag::LinkedText)? {
        Value::LinkedText(value) => Ok(value),
        other => Err(mismatch(TypeTag::LinkedText, &other)),
    }
}

/// Reads a non-negative int used as a length or offset.
fn read_len(reader: &mut WireReader<'_>, what: &str) -> CodecResult<usize> {
    let offset = reader.position();
    let value = read_int(reader)?;
    usize::try_from(value).map_err(|_| CodecError::InvalidValue {
        offset,
        message: format!("negative {what} {value}"),
    })
}

fn read_uid(reader: &mut WireReader<'_>) -> CodecResult<NoteId> {
    let offset = reader.position();
    let uid = read_int(reader)?;
    if uid < 0 {
        return Err(CodecError::InvalidValue {
            offset,
            message: format!("negative note id {uid}"),
        });
    }
    Ok(uid)
}

fn read_role(reader: &mut WireReader<'_>) -> CodecResult<RelationRole> {
    let offset = reader.position();
    let code = read_int(reader)?;
    RelationRole::from_code(code).ok_or_else(|| CodecError::InvalidValue {
        offset,
        message: format!("unknown relation role {code}"),
    })
}

fn mismatch(expected: TypeTag, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        expected,
        found: found.type_tag().as_byte(),
    }
}

fn wrong_encoder(expected: TypeTag, value: ValueRef<'_>) -> CodecError {
    CodecError::UnencodableValue(format!(
        "{} encoder received {} value",
        expected.name(),
        value.type_tag().name()
    ))
}

/// NaN never compares equal to itself, so it could not survive a round trip.
fn finite(value: f32, tag: TypeTag) -> CodecResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CodecError::UnencodableValue(format!(
            "non-finite {} {value}",
            tag.name()
        )))
    }
}

fn int_of(value: usize, what: &str) -> CodecResult<i32> {
    i32::try_from(value)
        .map_err(|_| CodecError::UnencodableValue(format!("{what} {value} exceeds i32 range")))
}

fn encode_int_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Int(int) = value else {
        return Err(wrong_encoder(TypeTag::Int, value));
    };
    wire::write_i32(buf, int);
    Ok(())
}

fn decode_int_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    Ok(Value::Int(reader.read_i32()?))
}

fn encode_float_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Float(float) = value else {
        return Err(wrong_encoder(TypeTag::Float, value));
    };
    finite(float, TypeTag::Float)?;
    wire::write_f32(buf, float);
    Ok(())
}

fn decode_float_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    Ok(Value::Float(reader.read_f32()?))
}

fn encode_str_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Str(text) = value else {
        return Err(wrong_encoder(TypeTag::Str, value));
    };
    encode_into(int_of(text.len(), "string length")?, buf)?;
    buf.extend_from_slice(text.as_bytes());
    Ok(())
}

fn decode_str_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let len = read_len(reader, "string length")?;
    Ok(Value::Str(reader.read_utf8(len)?.to_string()))
}

fn encode_timestamp_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Timestamp(time) = value else {
        return Err(wrong_encoder(TypeTag::Timestamp, value));
    };
    finite(time.secs(), TypeTag::Timestamp)?;
    wire::write_f32(buf, time.secs());
    Ok(())
}

fn decode_timestamp_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    Ok(Value::Timestamp(Timestamp::from_secs(reader.read_f32()?)))
}

fn encode_linked_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::LinkedText(linked) = value else {
        return Err(wrong_encoder(TypeTag::LinkedText, value));
    };
    encode_into(linked.text(), buf)?;
    encode_into(int_of(linked.links().len(), "link count")?, buf)?;
    for link in linked.links() {
        encode_into(int_of(link.pos.start, "link start")?, buf)?;
        encode_into(int_of(link.pos.end, "link end")?, buf)?;
        encode_into(link.dest, buf)?;
    }
    Ok(())
}

fn decode_linked_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let text = read_string(reader)?;
    let count = read_len(reader, "link count")?;
    // Each link needs at least three framed ints.
    let mut links = Vec::with_capacity(count.min(reader.remaining() / 27));
    for _ in 0..count {
        let start = read_len(reader, "link start")?;
        let end = read_len(reader, "link end")?;
        let dest = read_uid(reader)?;
        links.push(Link::new(Pos::new(start, end), dest));
    }
    let offset = reader.position();
    LinkedText::new(text, links)
        .map(Value::LinkedText)
        .map_err(|err| CodecError::InvalidValue {
            offset,
            message: err.to_string(),
        })
}

fn encode_tool_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Note(Note::Tool(note)) = value else {
        return Err(wrong_encoder(TypeTag::ToolNote, value));
    };
    encode_into(note.uid(), buf)?;
    encode_into(note.name(), buf)?;
    encode_into(note.cmd(), buf)?;
    encode_into(note.ver(), buf)?;
    encode_into(note.desc(), buf)
}

fn decode_tool_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let note = ToolNote::from_parts(
        read_uid(reader)?,
        read_string(reader)?,
        read_string(reader)?,
        read_string(reader)?,
        read_linked(reader)?,
    );
    Ok(Value::Note(Note::Tool(note)))
}

fn encode_action_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Note(Note::Action(note)) = value else {
        return Err(wrong_encoder(TypeTag::ActionNote, value));
    };
    encode_into(note.uid(), buf)?;
    encode_into(note.shellcmd(), buf)?;
    encode_into(note.toolcmd(), buf)?;
    encode_into(note.time(), buf)?;
    encode_into(note.desc(), buf)
}

fn decode_action_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let note = ActionNote::from_parts(
        read_uid(reader)?,
        read_linked(reader)?,
        read_linked(reader)?,
        read_timestamp(reader)?,
        read_linked(reader)?,
    );
    Ok(Value::Note(Note::Action(note)))
}

fn decode_data_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let note = DataNote::from_parts(
        UNASSIGNED_ID,
        read_string(reader)?,
        read_string(reader)?,
        read_linked(reader)?,
        read_linked(reader)?,
    );
    Ok(Value::Note(Note::Data(note)))
}

fn encode_data_v2(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Note(Note::Data(note)) = value else {
        return Err(wrong_encoder(TypeTag::DataNote, value));
    };
    encode_into(note.uid(), buf)?;
    encode_into(note.name(), buf)?;
    encode_into(note.path(), buf)?;
    encode_into(note.src(), buf)?;
    encode_into(note.desc(), buf)
}

fn decode_data_v2(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let note = DataNote::from_parts(
        read_uid(reader)?,
        read_string(reader)?,
        read_string(reader)?,
        read_linked(reader)?,
        read_linked(reader)?,
    );
    Ok(Value::Note(Note::Data(note)))
}

fn encode_relation_v1(value: ValueRef<'_>, buf: &mut Vec<u8>) -> CodecResult<()> {
    let ValueRef::Relation(relation) = value else {
        return Err(wrong_encoder(TypeTag::Relation, value));
    };
    encode_into(relation.uid_a, buf)?;
    encode_into(relation.uid_b, buf)?;
    encode_into(relation.role_a.code(), buf)?;
    encode_into(relation.role_b.code(), buf)
}

fn decode_relation_v1(reader: &mut WireReader<'_>) -> CodecResult<Value> {
    let relation = Relation::new(
        read_uid(reader)?,
        read_uid(reader)?,
        read_role(reader)?,
        read_role(reader)?,
    );
    Ok(Value::Relation(relation))
}

#[cfg(test)]
mod tests {
    use super::{decode_all, decode_prefix, encode, latest_version, CODECS};
    use crate::codec::{CodecError, TypeTag, Value};
    use std::collections::HashSet;

    #[test]
    fn table_versions_are_unique_and_increasing_per_tag() {
        let mut seen = HashSet::new();
        let mut last_version = std::collections::HashMap::new();
        for codec in CODECS {
            assert!(codec.version >= 1);
            assert!(seen.insert((codec.tag, codec.version)));
            if let Some(previous) = last_version.insert(codec.tag, codec.version) {
                assert!(codec.version > previous, "{:?} not increasing", codec.tag);
            }
        }
    }

    #[test]
    fn newest_encoder_wins() {
        assert_eq!(latest_version(TypeTag::DataNote), Some(2));
        assert_eq!(latest_version(TypeTag::ToolNote), Some(1));
    }

    #[test]
    fn int_layout_is_tag_version_payload() {
        let bytes = encode(-2).unwrap();
        assert_eq!(bytes, vec![b'i', 1, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn string_length_prefix_is_framed_byte_length() {
        let bytes = encode("hé").unwrap();
        let mut expected = vec![b's', 1, 0, 0, 0, b'i', 1, 0, 0, 0, 3, 0, 0, 0];
        expected.extend_from_slice("hé".as_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn prefix_decode_reports_consumed_bytes() {
        let mut bytes = encode(7).unwrap();
        bytes.extend(encode("tail").unwrap());
        let (value, consumed) = decode_prefix(&bytes).unwrap();
        assert_eq!(value, Value::Int(7));
        assert_eq!(consumed, 9);
    }

    #[test]
    fn negative_string_length_is_invalid() {
        let bytes = vec![b's', 1, 0, 0, 0, b'i', 1, 0, 0, 0, 0xff, 0xff, 0xff, 0xff];
        let err = decode_all(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::InvalidValue { offset: 5, .. }));
    }

    #[test]
    fn nested_slot_rejects_wrong_tag_before_dispatch() {
        // String whose length slot holds a float.
        let bytes = vec![b's', 1, 0, 0, 0, b'f', 1, 0, 0, 0, 0, 0, 0, 0];
        let err = decode_all(&bytes).unwrap_err();
        assert_eq!(
            err,
            CodecError::TypeMismatch {
                expected: TypeTag::Int,
                found: b'f'
            }
        );
    }
}
