//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` so the common table OIDs
//! (`base.column.index`) never touch the heap.

use crate::error::{DecodeErrorKind, Error, OidErrorKind, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs allowed in an OID (RFC 2578 Section 3.5).
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordered lexicographically by arc, so a proper prefix sorts before any of
/// its descendants. This is the order agents walk in.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from any iterator of arcs.
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.len(), 4);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse dotted notation, e.g. `"1.3.6.1.2.1.1.1.0"`.
    ///
    /// A single leading dot is accepted (`".1.3.6.1"`), as printed by
    /// net-snmp tools. Empty components and non-numeric arcs are rejected.
    ///
    /// ```
    /// use snmp_tables::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.2.1.1.1.0").unwrap();
    /// assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    /// assert!(Oid::parse("1..3").is_err());
    /// assert!(Oid::parse("1.3.six").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix('.').unwrap_or(body);
        if body.is_empty() {
            return Err(Error::invalid_oid_with_input(OidErrorKind::Empty, s));
        }

        let mut arcs = SmallVec::new();
        for part in body.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid_with_input(OidErrorKind::InvalidArc, s))?;
            arcs.push(arc);
        }

        if arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid_with_input(
                OidErrorKind::TooManyArcs {
                    count: arcs.len(),
                    max: MAX_OID_LEN,
                },
                s,
            ));
        }

        Ok(Self { arcs })
    }

    /// The arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Whether `self` lies in the subtree rooted at `other` (or equals it).
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// Arcs following `prefix`, if `self` lies under it.
    ///
    /// ```
    /// use snmp_tables::oid;
    ///
    /// let entry = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1);
    /// let cell = oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, 10);
    /// assert_eq!(cell.suffix_after(&entry), Some(&[2, 10][..]));
    /// assert_eq!(entry.suffix_after(&cell), None);
    /// ```
    pub fn suffix_after(&self, prefix: &Oid) -> Option<&[u32]> {
        if self.starts_with(prefix) {
            Some(&self.arcs[prefix.arcs.len()..])
        } else {
            None
        }
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Encode the arcs as BER content octets (no tag or length).
    ///
    /// The first two arcs share one subidentifier (`arc1 * 40 + arc2`),
    /// every following arc is base-128 with continuation bits.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.arcs.as_slice() {
            [] => {}
            [first] => encode_subidentifier(&mut bytes, first.saturating_mul(40)),
            [first, second, rest @ ..] => {
                encode_subidentifier(&mut bytes, first.saturating_mul(40).saturating_add(*second));
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }

        bytes
    }

    /// Decode BER content octets, enforcing [`MAX_OID_LEN`].
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();
        let (first, mut pos) = decode_subidentifier(data, 0)?;
        match first {
            0..40 => arcs.extend([0, first]),
            40..80 => arcs.extend([1, first - 40]),
            _ => arcs.extend([2, first - 80]),
        }

        while pos < data.len() {
            let (arc, next) = decode_subidentifier(data, pos)?;
            arcs.push(arc);
            pos = next;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::decode(
                    pos,
                    DecodeErrorKind::OidTooLong {
                        count: arcs.len(),
                        max: MAX_OID_LEN,
                    },
                ));
            }
        }

        Ok(Self { arcs })
    }
}

fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    if value == 0 {
        bytes.push(0);
        return;
    }

    let groups = (32 - value.leading_zeros()).div_ceil(7);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode one base-128 subidentifier starting at `pos`, returning the value
/// and the position just after it.
fn decode_subidentifier(data: &[u8], mut pos: usize) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    loop {
        let Some(&byte) = data.get(pos) else {
            return Err(Error::decode(pos, DecodeErrorKind::TruncatedData));
        };
        pos += 1;

        if value > (u32::MAX >> 7) {
            return Err(Error::decode(pos, DecodeErrorKind::IntegerOverflow));
        }
        value = (value << 7) | u32::from(byte & 0x7F);

        if byte & 0x80 == 0 {
            return Ok((value, pos));
        }
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Conversion into an [`Oid`], used by the string-friendly entry points.
///
/// Lets [`Session`](crate::Session) and [`TableSpec`](crate::TableSpec)
/// accept either dotted strings or already-built OIDs.
pub trait IntoOid {
    fn into_oid(self) -> Result<Oid>;
}

impl IntoOid for Oid {
    fn into_oid(self) -> Result<Oid> {
        Ok(self)
    }
}

impl IntoOid for &Oid {
    fn into_oid(self) -> Result<Oid> {
        Ok(self.clone())
    }
}

impl IntoOid for &str {
    fn into_oid(self) -> Result<Oid> {
        Oid::parse(self)
    }
}

impl IntoOid for String {
    fn into_oid(self) -> Result<Oid> {
        Oid::parse(&self)
    }
}

impl IntoOid for &String {
    fn into_oid(self) -> Result<Oid> {
        Oid::parse(self)
    }
}

/// Build an OID from literal arcs.
///
/// ```
/// use snmp_tables::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_and_display() {
        let oid = Oid::parse("1.3.6.1.2.1.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.1.1.0");
    }

    #[test]
    fn test_parse_leading_dot() {
        assert_eq!(Oid::parse(".1.3.6.1").unwrap(), oid!(1, 3, 6, 1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", ".", "1..3", "1.3.", "1.a.3", "1.3.-6", "1.3.4294967296"] {
            assert!(
                matches!(Oid::parse(input), Err(Error::InvalidOid { .. })),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_too_many_arcs() {
        let long = vec!["1"; MAX_OID_LEN + 1].join(".");
        assert!(matches!(
            Oid::parse(&long),
            Err(Error::InvalidOid {
                kind: OidErrorKind::TooManyArcs { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_suffix_after() {
        let base = oid!(1, 3, 6, 1, 4, 1, 9);
        let cell = oid!(1, 3, 6, 1, 4, 1, 9, 3, 4, 10, 0, 0, 1);
        assert_eq!(cell.suffix_after(&base), Some(&[3, 4, 10, 0, 0, 1][..]));
        assert_eq!(base.suffix_after(&base), Some(&[][..]));
        assert_eq!(oid!(1, 3, 6, 2).suffix_after(&base), None);
    }

    #[test]
    fn test_ordering_is_lexicographic_by_arc() {
        assert!(oid!(1, 3, 6, 1, 2) < oid!(1, 3, 6, 1, 10));
        assert!(oid!(1, 3, 6, 1) < oid!(1, 3, 6, 1, 0));
        assert!(oid!(1, 3, 6, 1, 2, 9) < oid!(1, 3, 6, 1, 3));
    }

    #[test]
    fn test_ber_encoding() {
        assert_eq!(oid!(1, 3, 6, 1).to_ber_smallvec().as_slice(), &[0x2B, 0x06, 0x01]);
        // 2.999.3: first subidentifier 1079 needs two octets
        assert_eq!(oid!(2, 999, 3).to_ber_smallvec().as_slice(), &[0x88, 0x37, 0x03]);
        assert_eq!(oid!(1, 3, 128).to_ber_smallvec().as_slice(), &[0x2B, 0x81, 0x00]);
    }

    #[test]
    fn test_from_ber_truncated() {
        assert!(matches!(
            Oid::from_ber(&[0x2B, 0x81]),
            Err(Error::Decode {
                kind: DecodeErrorKind::TruncatedData,
                ..
            })
        ));
    }

    #[test]
    fn test_from_ber_enforces_max_len() {
        let mut data = vec![0x2B];
        data.extend(std::iter::repeat_n(0x01, MAX_OID_LEN));
        assert!(matches!(
            Oid::from_ber(&data),
            Err(Error::Decode {
                kind: DecodeErrorKind::OidTooLong { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_into_oid() {
        let expected = oid!(1, 3, 6, 1);
        assert_eq!("1.3.6.1".into_oid().unwrap(), expected);
        assert_eq!(String::from("1.3.6.1").into_oid().unwrap(), expected);
        assert_eq!((&expected).into_oid().unwrap(), expected);
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(arcs in proptest::collection::vec(any::<u32>(), 1..40)) {
            let oid = Oid::new(arcs);
            prop_assert_eq!(Oid::parse(&oid.to_string()).unwrap(), oid);
        }

        #[test]
        fn prop_ber_roundtrip(
            first in 0u32..2,
            second in 0u32..40,
            rest in proptest::collection::vec(any::<u32>(), 0..30),
        ) {
            let oid = Oid::new([first, second].into_iter().chain(rest));
            prop_assert_eq!(Oid::from_ber(&oid.to_ber_smallvec()).unwrap(), oid);
        }

        #[test]
        fn prop_child_sorts_after_parent(arcs in proptest::collection::vec(any::<u32>(), 1..20), arc: u32) {
            let parent = Oid::new(arcs);
            let child = parent.child(arc);
            prop_assert!(child > parent);
            prop_assert!(child.starts_with(&parent));
        }
    }
}
