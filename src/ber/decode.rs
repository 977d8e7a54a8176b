//! BER decoding.
//!
//! Zero-copy: octet strings are `Bytes` slices of the received datagram.
//! Nested decoders remember their position in the outer message so error
//! offsets always point into the original buffer.

use super::length::decode_length;
use super::tag;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// Cursor over a BER-encoded buffer.
pub struct Decoder {
    data: Bytes,
    offset: usize,
    base: usize,
}

impl Decoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            base: 0,
        }
    }

    /// Create a decoder over a copy of `data`.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Absolute offset of the cursor within the outermost message.
    pub fn offset(&self) -> usize {
        self.base + self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn peek_tag(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    pub fn read_tag(&mut self) -> Result<u8> {
        let tag = self
            .peek_tag()
            .ok_or_else(|| Error::decode(self.offset(), DecodeErrorKind::TruncatedData))?;
        self.offset += 1;
        Ok(tag)
    }

    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset())?;
        self.offset += consumed;
        Ok(len)
    }

    /// Take the next `len` octets without copying.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let end = self.offset.saturating_add(len);
        if end > self.data.len() {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::InsufficientData {
                    needed: len,
                    available: self.remaining(),
                },
            ));
        }
        let bytes = self.data.slice(self.offset..end);
        self.offset = end;
        Ok(bytes)
    }

    /// Read a tag, fail unless it equals `expected`, and return the length.
    pub fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let at = self.offset();
        let actual = self.read_tag()?;
        if actual != expected {
            return Err(Error::decode(
                at,
                DecodeErrorKind::UnexpectedTag { expected, actual },
            ));
        }
        self.read_length()
    }

    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Signed INTEGER content of `len` octets.
    ///
    /// Non-minimal encodings are accepted as long as the value fits in 32
    /// bits.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        let at = self.offset();
        let bytes = self.read_content(len, 8)?;
        let seed: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        let value = bytes
            .iter()
            .fold(seed, |acc, &b| (acc << 8) | i64::from(b));
        i32::try_from(value).map_err(|_| Error::decode(at, DecodeErrorKind::IntegerOverflow))
    }

    /// Unsigned 32-bit content (Counter32, Gauge32, TimeTicks).
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        let at = self.offset();
        let value = self.read_unsigned64_value(len)?;
        u32::try_from(value).map_err(|_| Error::decode(at, DecodeErrorKind::IntegerOverflow))
    }

    /// Unsigned 64-bit content (Counter64). Up to nine octets, the first of
    /// which must then be a zero sign guard.
    pub fn read_unsigned64_value(&mut self, len: usize) -> Result<u64> {
        let at = self.offset();
        let bytes = self.read_content(len, 9)?;
        if bytes.len() == 9 && bytes[0] != 0 {
            return Err(Error::decode(at, DecodeErrorKind::IntegerOverflow));
        }
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }

    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    pub fn read_null(&mut self) -> Result<()> {
        let at = self.offset();
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let at = self.offset();
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|err| match err {
            Error::Decode { offset, kind } => Error::decode(at + offset, kind),
            other => other,
        })
    }

    /// Enter a SEQUENCE, returning a decoder over its contents.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Enter a constructed value with the given tag.
    pub fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        self.sub_decoder(len)
    }

    /// Split off the next `len` octets as a nested decoder.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let base = self.offset();
        let data = self.read_bytes(len)?;
        Ok(Decoder {
            data,
            offset: 0,
            base,
        })
    }

    fn read_content(&mut self, len: usize, max: usize) -> Result<Bytes> {
        if len == 0 {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::ZeroLengthInteger,
            ));
        }
        if len > max {
            return Err(Error::decode(
                self.offset(),
                DecodeErrorKind::IntegerTooLong { length: len },
            ));
        }
        self.read_bytes(len)
    }
}
