//! BER definite-length codec (X.690 Section 8.1.3).
//!
//! Indefinite lengths (0x80) never appear in SNMP and are rejected.

use crate::error::{DecodeErrorKind, Error, Result};

/// Largest length accepted while decoding (2 MiB).
pub const MAX_LENGTH: usize = 0x20_0000;

/// Encode a length, returning the octets in reverse order together with how
/// many of them are valid. Reverse order lets [`EncodeBuf`](super::EncodeBuf)
/// append them directly.
pub fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut out = [0u8; 5];
    if len <= 0x7F {
        out[0] = len as u8;
        return (out, 1);
    }

    let mut count = 0;
    let mut rest = len;
    while rest > 0 && count < 4 {
        out[count] = rest as u8;
        rest >>= 8;
        count += 1;
    }
    out[count] = 0x80 | count as u8;
    (out, count + 1)
}

/// Decode a length at the start of `data`, returning the length and the
/// number of octets consumed. `base_offset` positions errors in the
/// enclosing message.
pub fn decode_length(data: &[u8], base_offset: usize) -> Result<(usize, usize)> {
    let Some(&first) = data.first() else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };

    if first & 0x80 == 0 {
        return Ok((usize::from(first), 1));
    }

    let octets = usize::from(first & 0x7F);
    match octets {
        0 => return Err(Error::decode(base_offset, DecodeErrorKind::IndefiniteLength)),
        1..=4 => {}
        _ => {
            return Err(Error::decode(
                base_offset,
                DecodeErrorKind::LengthTooLong { octets },
            ));
        }
    }

    let Some(bytes) = data.get(1..=octets) else {
        return Err(Error::decode(base_offset, DecodeErrorKind::TruncatedData));
    };
    let len = bytes
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));

    if len > MAX_LENGTH {
        return Err(Error::decode(
            base_offset,
            DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            },
        ));
    }

    Ok((len, octets + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(len: usize) -> Vec<u8> {
        let (bytes, count) = encode_length(len);
        bytes[..count].iter().rev().copied().collect()
    }

    #[test]
    fn test_encode_short_and_long_forms() {
        assert_eq!(encoded(0), vec![0x00]);
        assert_eq!(encoded(127), vec![0x7F]);
        assert_eq!(encoded(128), vec![0x81, 0x80]);
        assert_eq!(encoded(256), vec![0x82, 0x01, 0x00]);
        assert_eq!(encoded(0x01_0000), vec![0x83, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn test_decode_forms() {
        assert_eq!(decode_length(&[0x05], 0).unwrap(), (5, 1));
        assert_eq!(decode_length(&[0x81, 0xC8], 0).unwrap(), (200, 2));
        assert_eq!(decode_length(&[0x82, 0x01, 0x00], 0).unwrap(), (256, 3));
    }

    #[test]
    fn test_decode_rejects_indefinite() {
        assert!(matches!(
            decode_length(&[0x80], 7),
            Err(Error::Decode {
                offset: 7,
                kind: DecodeErrorKind::IndefiniteLength
            })
        ));
    }

    #[test]
    fn test_decode_rejects_oversized() {
        assert!(matches!(
            decode_length(&[0x84, 0x7F, 0xFF, 0xFF, 0xFF], 0),
            Err(Error::Decode {
                kind: DecodeErrorKind::LengthExceedsMax { .. },
                ..
            })
        ));
        assert!(matches!(
            decode_length(&[0x85, 0, 0, 0, 0, 1], 0),
            Err(Error::Decode {
                kind: DecodeErrorKind::LengthTooLong { octets: 5 },
                ..
            })
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            decode_length(&[0x82, 0x01], 0),
            Err(Error::Decode {
                kind: DecodeErrorKind::TruncatedData,
                ..
            })
        ));
    }
}
