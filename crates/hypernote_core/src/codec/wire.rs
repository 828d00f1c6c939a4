//! Byte-level framing for the registry file format.
//!
//! Record layout:
//! ```text
//! [tag:1][version:4]   — ASCII type tag, little-endian i32 format version
//! [payload:N]          — type-specific, defined by the codec table
//! ```
//!
//! # Invariants
//! - All multi-byte integers and floats are little-endian.
//! - `WireReader` never reads past the end of its buffer; short reads are
//!   reported as `UnexpectedEof` with the failing offset.

use super::{CodecError, CodecResult};

/// Size of the `tag + version` prefix carried by every encoded value.
pub const HEADER_SIZE: usize = 5;

/// Writes the shared `tag + version` header.
pub fn write_header(buf: &mut Vec<u8>, tag: u8, version: i32) {
    buf.push(tag);
    write_i32(buf, version);
}

/// Writes a raw little-endian i32 (no header).
pub fn write_i32(buf: &mut Vec<u8>, value: i32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Writes a raw little-endian IEEE-754 f32 (no header).
pub fn write_f32(buf: &mut Vec<u8>, value: f32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

/// Cursor over an encoded byte buffer.
pub struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the buffer.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if n > self.remaining() {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: n,
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        let bytes = self.read_bytes(4)?;
        Ok(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads UTF-8 text of exactly `len` bytes.
    pub fn read_utf8(&mut self, len: usize) -> CodecResult<&'a str> {
        let offset = self.pos;
        let bytes = self.read_bytes(len)?;
        std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8 { offset })
    }

    /// Reads the `tag + version` header of the next value.
    pub fn read_header(&mut self) -> CodecResult<(u8, i32)> {
        let tag = self.read_u8()?;
        let version = self.read_i32()?;
        Ok((tag, version))
    }
}

#[cfg(test)]
mod tests {
    use super::{write_header, write_i32, WireReader, HEADER_SIZE};
    use crate::codec::CodecError;

    #[test]
    fn header_is_tag_then_little_endian_version() {
        let mut buf = Vec::new();
        write_header(&mut buf, b'T', 2);
        assert_eq!(buf, vec![b'T', 2, 0, 0, 0]);
        assert_eq!(buf.len(), HEADER_SIZE);

        let mut reader = WireReader::new(&buf);
        assert_eq!(reader.read_header().unwrap(), (b'T', 2));
        assert!(reader.is_empty());
    }

    #[test]
    fn negative_ints_use_twos_complement() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -1);
        assert_eq!(buf, vec![0xff, 0xff, 0xff, 0xff]);
        assert_eq!(WireReader::new(&buf).read_i32().unwrap(), -1);
    }

    #[test]
    fn short_read_reports_offset() {
        let buf = [1u8, 2, 3];
        let mut reader = WireReader::new(&buf);
        reader.read_u8().unwrap();
        let err = reader.read_i32().unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEof {
                offset: 1,
                needed: 4
            }
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let buf = [0xffu8, 0xfe];
        let err = WireReader::new(&buf).read_utf8(2).unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8 { offset: 0 }));
    }
}
