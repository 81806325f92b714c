//! Byte cursor and variable-length primitives for the Marshal 4.8 format.

use crate::error::DecodeError;
use crate::util::strtod;

/// Sequential reader over an in-memory byte buffer.
///
/// Owns the read position and reports truncation with the exact byte offset
/// at which more input was needed.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current position in the data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of remaining bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Returns true if all data has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Reads a single byte.
    #[inline]
    pub fn read_byte(&mut self, context: &'static str) -> Result<u8, DecodeError> {
        if self.pos >= self.data.len() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                context,
            });
        }
        let byte = self.data[self.pos];
        self.pos += 1;
        Ok(byte)
    }

    /// Reads exactly n bytes.
    #[inline]
    pub fn read_bytes(&mut self, n: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if n > self.data.len() - self.pos {
            return Err(DecodeError::UnexpectedEof {
                offset: self.data.len(),
                context,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Reads a Marshal variable-length signed integer.
    ///
    /// Header byte `h` (as a signed byte): `h == 0` is zero; `|h| >= 5`
    /// inlines the value `sign(h) * (|h| - 5)` in the header itself;
    /// `1 <= |h| <= 4` is followed by that many little-endian bytes `v`,
    /// giving `v` for positive headers and `-(2^(8*|h|) - v)` for negative
    /// ones. Used both for length prefixes and for inline fixnum literals.
    pub fn read_long(&mut self, context: &'static str) -> Result<i64, DecodeError> {
        let header = self.read_byte(context)? as i8;
        if header == 0 {
            return Ok(0);
        }
        let magnitude = i64::from(header).unsigned_abs() as u32;
        let negative = header < 0;
        if magnitude >= 5 {
            let inline = i64::from(magnitude) - 5;
            return Ok(if negative { -inline } else { inline });
        }
        let mut value: u64 = 0;
        for i in 0..magnitude {
            let byte = self.read_byte(context)?;
            value |= u64::from(byte) << (8 * i);
        }
        if negative {
            Ok(value as i64 - (1i64 << (8 * magnitude)))
        } else {
            Ok(value as i64)
        }
    }

    /// Reads a `read_long`-prefixed raw byte string.
    pub fn read_byte_seq(&mut self, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let header_offset = self.pos;
        let len = self.read_long(context)?;
        if len < 0 {
            return Err(DecodeError::NegativeLength {
                offset: header_offset,
                value: len,
            });
        }
        self.read_bytes(len as usize, context)
    }

    /// Reads a float literal: a byte sequence holding either one of the
    /// exact lowercase special literals or a C-style numeric literal.
    ///
    /// Only the lowercase spellings `inf`, `-inf`, `nan` are recognized as
    /// specials; other casings fall through to the numeric parse and decode
    /// to `0.0`. This is a contractual quirk of the format, not a bug.
    pub fn read_float(&mut self, context: &'static str) -> Result<f64, DecodeError> {
        let bytes = self.read_byte_seq(context)?;
        Ok(match bytes {
            b"inf" => f64::INFINITY,
            b"-inf" => f64::NEG_INFINITY,
            b"nan" => f64::NAN,
            _ => strtod::parse_f64(bytes),
        })
    }
}
