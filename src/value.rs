//! SNMP value types.
//!
//! [`Value`] is the wire-level view of a variable binding's value, including
//! the v2c exception markers. [`Native`] is the script-friendly view with
//! integer widths collapsed and addresses and time ticks interpreted.

use std::net::Ipv4Addr;
use std::time::Duration;

use crate::ber::{Decoder, EncodeBuf, tag};
use crate::codec;
use crate::error::{DecodeErrorKind, Error, Result};
use crate::oid::Oid;
use bytes::Bytes;

/// SNMP value.
///
/// Values are `Eq + Hash`, so they can key value mappings and frequency
/// counts directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (signed 32-bit)
    Integer(i32),
    /// OCTET STRING
    OctetString(Bytes),
    Null,
    ObjectIdentifier(Oid),
    /// IpAddress (network byte order)
    IpAddress([u8; 4]),
    /// Counter32 (wrapping)
    Counter32(u32),
    /// Gauge32 / Unsigned32
    Gauge32(u32),
    /// TimeTicks (hundredths of a second)
    TimeTicks(u32),
    Opaque(Bytes),
    /// Counter64, v2c only.
    Counter64(u64),
    /// The agent does not implement this object.
    NoSuchObject,
    /// The object exists but this instance does not.
    NoSuchInstance,
    /// No OID follows the requested one.
    EndOfMibView,
    /// Unrecognized tag, kept verbatim.
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// `Some` for [`Value::Integer`].
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// `Some` for the unsigned 32-bit types and non-negative integers.
    ///
    /// ```
    /// use snmp_tables::Value;
    ///
    /// assert_eq!(Value::Gauge32(200).as_u32(), Some(200));
    /// assert_eq!(Value::Integer(-1).as_u32(), None);
    /// assert_eq!(Value::Counter64(1).as_u32(), None);
    /// ```
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) => u32::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Like [`as_u32`](Self::as_u32) but also accepting Counter64.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            other => other.as_u32().map(u64::from),
        }
    }

    /// Raw octets of an OCTET STRING or Opaque.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Octets as UTF-8 text, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<Ipv4Addr> {
        match self {
            Value::IpAddress(bytes) => Some(Ipv4Addr::from(*bytes)),
            _ => None,
        }
    }

    /// TimeTicks as a [`Duration`].
    ///
    /// ```
    /// use snmp_tables::Value;
    /// use std::time::Duration;
    ///
    /// assert_eq!(Value::TimeTicks(150).as_duration(), Some(Duration::from_millis(1500)));
    /// ```
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Value::TimeTicks(ticks) => Some(codec::time_ticks(*ticks)),
            _ => None,
        }
    }

    /// Whether this is one of the v2c exception markers.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Convert to the script-friendly [`Native`] form.
    ///
    /// ```
    /// use snmp_tables::{Native, Value};
    ///
    /// assert_eq!(Value::Counter32(7).to_native(), Native::Unsigned(7));
    /// assert_eq!(Value::IpAddress([10, 1, 2, 3]).to_native(), Native::Text("10.1.2.3".into()));
    /// assert_eq!(Value::from("eth0").to_native(), Native::Text("eth0".into()));
    /// ```
    pub fn to_native(&self) -> Native {
        match self {
            Value::Integer(v) => Native::Integer(i64::from(*v)),
            Value::Counter32(v) | Value::Gauge32(v) => Native::Unsigned(u64::from(*v)),
            Value::Counter64(v) => Native::Unsigned(*v),
            Value::TimeTicks(v) => Native::Duration(codec::time_ticks(*v)),
            Value::IpAddress(addr) => Native::Text(Ipv4Addr::from(*addr).to_string()),
            Value::OctetString(data) | Value::Opaque(data) => match std::str::from_utf8(data) {
                Ok(text) => Native::Text(text.to_owned()),
                Err(_) => Native::Bytes(data.clone()),
            },
            Value::ObjectIdentifier(oid) => Native::Oid(oid.clone()),
            Value::Null
            | Value::NoSuchObject
            | Value::NoSuchInstance
            | Value::EndOfMibView
            | Value::Unknown { .. } => Native::Null,
        }
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(*addr),
            Value::Counter32(v) => buf.push_unsigned(tag::application::COUNTER32, u64::from(*v)),
            Value::Gauge32(v) => buf.push_unsigned(tag::application::GAUGE32, u64::from(*v)),
            Value::TimeTicks(v) => buf.push_unsigned(tag::application::TIMETICKS, u64::from(*v)),
            Value::Opaque(data) => buf.push_tlv(tag::application::OPAQUE, data),
            Value::Counter64(v) => buf.push_unsigned(tag::application::COUNTER64, *v),
            Value::NoSuchObject => buf.push_tlv(tag::context::NO_SUCH_OBJECT, &[]),
            Value::NoSuchInstance => buf.push_tlv(tag::context::NO_SUCH_INSTANCE, &[]),
            Value::EndOfMibView => buf.push_tlv(tag::context::END_OF_MIB_VIEW, &[]),
            Value::Unknown { tag: t, data } => buf.push_tlv(*t, data),
        }
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let at = decoder.offset();
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(Error::decode(at, DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(Error::decode(
                        at,
                        DecodeErrorKind::InvalidIpAddressLength { length: len },
                    ));
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_unsigned64_value(len)?))
            }
            tag::context::NO_SUCH_OBJECT => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                decoder.read_bytes(len)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                decoder.read_bytes(len)?;
                Ok(Value::EndOfMibView)
            }
            tag::universal::OCTET_STRING_CONSTRUCTED => {
                Err(Error::decode(at, DecodeErrorKind::ConstructedOctetString))
            }
            _ => Ok(Value::Unknown {
                tag,
                data: decoder.read_bytes(len)?,
            }),
        }
    }
}

fn write_hex(f: &mut std::fmt::Formatter<'_>, data: &[u8]) -> std::fmt::Result {
    for byte in data {
        write!(f, "{:02x}", byte)?;
    }
    Ok(())
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => match std::str::from_utf8(data) {
                Ok(s) => f.write_str(s),
                Err(_) => {
                    f.write_str("0x")?;
                    write_hex(f, data)
                }
            },
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => write!(f, "{}", Ipv4Addr::from(*addr)),
            Value::Counter32(v) | Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                write!(
                    f,
                    "{}d {}h {}m {}.{:02}s",
                    secs / 86400,
                    (secs % 86400) / 3600,
                    (secs % 3600) / 60,
                    secs % 60,
                    v % 100
                )
            }
            Value::Opaque(data) => {
                f.write_str("Opaque(0x")?;
                write_hex(f, data)?;
                f.write_str(")")
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "Unknown(tag=0x{:02X}, data=0x", tag)?;
                write_hex(f, data)?;
                f.write_str(")")
            }
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<Ipv4Addr> for Value {
    fn from(addr: Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

/// A [`Value`] with its SNMP typing flattened into everyday Rust types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Native {
    /// INTEGER of any width.
    Integer(i64),
    /// Counter32, Gauge32, Counter64.
    Unsigned(u64),
    /// UTF-8 OCTET STRING, or an IpAddress in dotted form.
    Text(String),
    /// OCTET STRING that is not UTF-8.
    Bytes(Bytes),
    Oid(Oid),
    /// TimeTicks.
    Duration(Duration),
    /// NULL, exception markers and unknown tags.
    Null,
}
