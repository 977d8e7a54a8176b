//! Conversions between raw SNMP values and everyday representations.
//!
//! The read side formats the binary encodings agents commonly return
//! (MAC addresses, IPv4 addresses, time ticks). The write side turns a
//! caller-supplied [`SetValue`] into a typed wire [`Value`], either with an
//! explicit [`ValueType`] or one chosen by [`infer_value_type`].

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::value::Value;

/// Format six octets as a lower-case, colon-separated MAC address.
///
/// ```
/// use snmp_tables::codec::mac_address;
///
/// let mac = mac_address(&[0x74, 0x26, 0xac, 0x1b, 0xe7, 0xa1]).unwrap();
/// assert_eq!(mac, "74:26:ac:1b:e7:a1");
/// assert!(mac_address(&[0x74, 0x26]).is_err());
/// ```
pub fn mac_address(bytes: &[u8]) -> Result<String> {
    if bytes.len() != 6 {
        return Err(Error::InvalidLength {
            expected: 6,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(":"))
}

/// Format four octets as a dotted-quad IPv4 address.
pub fn ipv4_address(bytes: &[u8]) -> Result<String> {
    let octets: [u8; 4] = bytes.try_into().map_err(|_| Error::InvalidLength {
        expected: 4,
        actual: bytes.len(),
    })?;
    Ok(Ipv4Addr::from(octets).to_string())
}

/// Whether `text` is a dotted-quad IPv4 address.
///
/// Exactly four decimal components in `0..=255`. Leading zeros are read as
/// decimal (`"010.0.0.1"` is `10.0.0.1`); signs and whitespace are not
/// accepted.
pub fn is_ipv4_address(text: &str) -> bool {
    parse_ipv4(text).is_some()
}

fn parse_ipv4(text: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = text.split('.');
    for octet in &mut octets {
        let part = parts.next()?;
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *octet = part.parse().ok()?;
    }
    parts.next().is_none().then_some(Ipv4Addr::from(octets))
}

/// TimeTicks (hundredths of a second) as a [`Duration`].
pub fn time_ticks(ticks: u32) -> Duration {
    Duration::from_millis(u64::from(ticks) * 10)
}

/// A [`Duration`] as TimeTicks, truncated to the hundredth and saturating at
/// `u32::MAX`.
pub fn duration_to_time_ticks(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis() / 10).unwrap_or(u32::MAX)
}

/// SNMP type a SET value is encoded as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Integer,
    Integer32,
    Unsigned32,
    Counter32,
    Counter64,
    Gauge32,
    TimeTicks,
    IpAddress,
    OctetString,
}

impl ValueType {
    const NAMES: [(ValueType, &'static str); 9] = [
        (Self::Integer, "Integer"),
        (Self::Integer32, "Integer32"),
        (Self::Unsigned32, "Unsigned32"),
        (Self::Counter32, "Counter32"),
        (Self::Counter64, "Counter64"),
        (Self::Gauge32, "Gauge32"),
        (Self::TimeTicks, "TimeTicks"),
        (Self::IpAddress, "IpAddress"),
        (Self::OctetString, "OctetString"),
    ];

    /// Canonical type name.
    pub fn name(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(ty, _)| *ty == self)
            .map_or("", |(_, name)| *name)
    }

    /// Every supported type, in a stable order.
    pub fn all() -> impl Iterator<Item = ValueType> {
        Self::NAMES.iter().map(|(ty, _)| *ty)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    /// Parse a type name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self> {
        Self::NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(ty, _)| *ty)
            .ok_or_else(|| Error::UnknownValueType { name: s.into() })
    }
}

/// A value supplied for a SET, before it is given an SNMP type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValue {
    Integer(i64),
    Text(String),
    Bytes(Bytes),
    IpAddress(Ipv4Addr),
}

macro_rules! set_value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SetValue {
                fn from(v: $t) -> Self {
                    SetValue::Integer(i64::from(v))
                }
            }
        )*
    };
}

set_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for SetValue {
    fn from(s: &str) -> Self {
        SetValue::Text(s.to_owned())
    }
}

impl From<String> for SetValue {
    fn from(s: String) -> Self {
        SetValue::Text(s)
    }
}

impl From<Vec<u8>> for SetValue {
    fn from(data: Vec<u8>) -> Self {
        SetValue::Bytes(Bytes::from(data))
    }
}

impl From<&[u8]> for SetValue {
    fn from(data: &[u8]) -> Self {
        SetValue::Bytes(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for SetValue {
    fn from(data: Bytes) -> Self {
        SetValue::Bytes(data)
    }
}

/// Floats are truncated toward zero (saturating) and sent as integers.
impl From<f64> for SetValue {
    fn from(v: f64) -> Self {
        SetValue::Integer(v as i64)
    }
}

impl From<f32> for SetValue {
    fn from(v: f32) -> Self {
        SetValue::Integer(v as i64)
    }
}

impl From<Ipv4Addr> for SetValue {
    fn from(addr: Ipv4Addr) -> Self {
        SetValue::IpAddress(addr)
    }
}

/// Choose the SNMP type for a value when the caller did not name one.
///
/// Integers become `Integer`, dotted-quad text and addresses become
/// `IpAddress`, any other text or bytes become `OctetString`.
///
/// ```
/// use snmp_tables::codec::{SetValue, ValueType, infer_value_type};
///
/// assert_eq!(infer_value_type(&SetValue::from(42)), ValueType::Integer);
/// assert_eq!(infer_value_type(&SetValue::from("10.0.0.1")), ValueType::IpAddress);
/// assert_eq!(infer_value_type(&SetValue::from("router1")), ValueType::OctetString);
/// ```
pub fn infer_value_type(value: &SetValue) -> ValueType {
    match value {
        SetValue::Integer(_) => ValueType::Integer,
        SetValue::Text(text) if is_ipv4_address(text) => ValueType::IpAddress,
        SetValue::Text(_) | SetValue::Bytes(_) => ValueType::OctetString,
        SetValue::IpAddress(_) => ValueType::IpAddress,
    }
}

impl SetValue {
    /// The type [`infer_value_type`] would pick.
    pub fn inferred_type(&self) -> ValueType {
        infer_value_type(self)
    }

    /// Encode as `value_type`, checking that the value fits.
    pub fn into_value(self, value_type: ValueType) -> Result<Value> {
        match value_type {
            ValueType::Integer | ValueType::Integer32 => {
                let n = self.integer(value_type)?;
                i32::try_from(n)
                    .map(Value::Integer)
                    .map_err(|_| out_of_range(value_type, n))
            }
            ValueType::Unsigned32 | ValueType::Gauge32 => {
                self.unsigned32(value_type).map(Value::Gauge32)
            }
            ValueType::Counter32 => self.unsigned32(value_type).map(Value::Counter32),
            ValueType::TimeTicks => self.unsigned32(value_type).map(Value::TimeTicks),
            ValueType::Counter64 => {
                let n = self.integer(value_type)?;
                u64::try_from(n)
                    .map(Value::Counter64)
                    .map_err(|_| out_of_range(value_type, n))
            }
            ValueType::IpAddress => match self {
                SetValue::IpAddress(addr) => Ok(Value::from(addr)),
                SetValue::Text(text) => parse_ipv4(&text).map(Value::from).ok_or_else(|| {
                    Error::invalid_set_value(
                        value_type,
                        format!("{:?} is not a dotted-quad address", text),
                    )
                }),
                SetValue::Bytes(data) => {
                    let octets: [u8; 4] = data[..].try_into().map_err(|_| {
                        Error::invalid_set_value(
                            value_type,
                            format!("expected 4 octets, got {}", data.len()),
                        )
                    })?;
                    Ok(Value::IpAddress(octets))
                }
                SetValue::Integer(_) => Err(Error::invalid_set_value(
                    value_type,
                    "an integer is not an address",
                )),
            },
            ValueType::OctetString => match self {
                SetValue::Text(text) => Ok(Value::from(text)),
                SetValue::Bytes(data) => Ok(Value::OctetString(data)),
                SetValue::IpAddress(addr) => Ok(Value::from(addr.to_string())),
                SetValue::Integer(_) => Err(Error::invalid_set_value(
                    value_type,
                    "an integer is not a string",
                )),
            },
        }
    }

    fn integer(&self, value_type: ValueType) -> Result<i64> {
        match self {
            SetValue::Integer(n) => Ok(*n),
            SetValue::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                Error::invalid_set_value(value_type, format!("{:?} is not an integer", text))
            }),
            SetValue::Bytes(_) => Err(Error::invalid_set_value(
                value_type,
                "raw bytes are not an integer",
            )),
            SetValue::IpAddress(_) => Err(Error::invalid_set_value(
                value_type,
                "an address is not an integer",
            )),
        }
    }

    fn unsigned32(&self, value_type: ValueType) -> Result<u32> {
        let n = self.integer(value_type)?;
        u32::try_from(n).map_err(|_| out_of_range(value_type, n))
    }
}

fn out_of_range(value_type: ValueType, n: i64) -> Error {
    Error::invalid_set_value(value_type, format!("{} is out of range", n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address() {
        assert_eq!(
            mac_address(&[0x74, 0x26, 0xac, 0x1b, 0xe7, 0xa1]).unwrap(),
            "74:26:ac:1b:e7:a1"
        );
        assert_eq!(mac_address(&[0; 6]).unwrap(), "00:00:00:00:00:00");
        assert!(matches!(
            mac_address(&[1, 2, 3, 4, 5, 6, 7]),
            Err(Error::InvalidLength {
                expected: 6,
                actual: 7
            })
        ));
        assert!(matches!(
            mac_address(&[]),
            Err(Error::InvalidLength {
                expected: 6,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_ipv4_address() {
        assert_eq!(ipv4_address(&[10, 1, 2, 3]).unwrap(), "10.1.2.3");
        assert_eq!(ipv4_address(&[255, 255, 255, 0]).unwrap(), "255.255.255.0");
        assert!(matches!(
            ipv4_address(&[10, 1, 2]),
            Err(Error::InvalidLength {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_is_ipv4_address() {
        assert!(is_ipv4_address("10.0.0.1"));
        assert!(is_ipv4_address("255.255.255.255"));
        assert!(!is_ipv4_address("256.0.0.1"));
        assert!(!is_ipv4_address("10.0.0"));
        assert!(!is_ipv4_address("10.0.0.1.5"));
        assert!(!is_ipv4_address(" 10.0.0.1"));
        assert!(!is_ipv4_address("router1"));
        assert!(is_ipv4_address("010.000.0.01"));
        assert!(!is_ipv4_address("+10.0.0.1"));
        assert!(!is_ipv4_address("10..0.1"));
        assert!(!is_ipv4_address("0256.0.0.1"));
    }

    #[test]
    fn test_time_ticks() {
        assert_eq!(time_ticks(0), Duration::ZERO);
        assert_eq!(time_ticks(12_345), Duration::from_millis(123_450));
        assert_eq!(duration_to_time_ticks(Duration::from_millis(123_459)), 12_345);
        assert_eq!(duration_to_time_ticks(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn test_value_type_names() {
        for ty in ValueType::all() {
            assert_eq!(ty.to_string().parse::<ValueType>().unwrap(), ty);
        }
        assert_eq!("gauge32".parse::<ValueType>().unwrap(), ValueType::Gauge32);
        assert_eq!("IPADDRESS".parse::<ValueType>().unwrap(), ValueType::IpAddress);
        assert!(matches!(
            "Float".parse::<ValueType>(),
            Err(Error::UnknownValueType { .. })
        ));
    }

    #[test]
    fn test_infer_value_type() {
        assert_eq!(infer_value_type(&SetValue::from(-7i64)), ValueType::Integer);
        assert_eq!(infer_value_type(&SetValue::from(7u8)), ValueType::Integer);
        assert_eq!(
            infer_value_type(&SetValue::from(Ipv4Addr::new(10, 0, 0, 1))),
            ValueType::IpAddress
        );
        assert_eq!(
            infer_value_type(&SetValue::from("10.0.0.256")),
            ValueType::OctetString
        );
        assert_eq!(
            infer_value_type(&SetValue::from(vec![10u8, 0, 0, 1])),
            ValueType::OctetString
        );
    }

    #[test]
    fn test_into_value_numeric() {
        assert_eq!(
            SetValue::from(42).into_value(ValueType::Integer).unwrap(),
            Value::Integer(42)
        );
        assert_eq!(
            SetValue::from("300").into_value(ValueType::Gauge32).unwrap(),
            Value::Gauge32(300)
        );
        assert_eq!(
            SetValue::from(5).into_value(ValueType::Unsigned32).unwrap(),
            Value::Gauge32(5)
        );
        assert_eq!(
            SetValue::from(100).into_value(ValueType::TimeTicks).unwrap(),
            Value::TimeTicks(100)
        );
        assert_eq!(
            SetValue::from(i64::MAX).into_value(ValueType::Counter64).unwrap(),
            Value::Counter64(i64::MAX as u64)
        );
    }

    #[test]
    fn test_float_truncates_to_integer() {
        assert_eq!(SetValue::from(2.9), SetValue::Integer(2));
        assert_eq!(SetValue::from(-2.9f32), SetValue::Integer(-2));
        assert_eq!(
            SetValue::from(7.5).into_value(ValueType::Integer).unwrap(),
            Value::Integer(7)
        );
    }

    #[test]
    fn test_leading_zero_address_is_inferred_and_encoded() {
        let value = SetValue::from("010.000.0.01");
        assert_eq!(value.inferred_type(), ValueType::IpAddress);
        assert_eq!(
            value.into_value(ValueType::IpAddress).unwrap(),
            Value::IpAddress([10, 0, 0, 1])
        );
    }

    #[test]
    fn test_into_value_range_checks() {
        assert!(matches!(
            SetValue::from(-1).into_value(ValueType::Counter32),
            Err(Error::InvalidSetValue {
                value_type: ValueType::Counter32,
                ..
            })
        ));
        assert!(
            SetValue::from(i64::from(i32::MAX) + 1)
                .into_value(ValueType::Integer32)
                .is_err()
        );
        assert!(
            SetValue::from(u32::MAX)
                .into_value(ValueType::Gauge32)
                .is_ok()
        );
        assert!(SetValue::from(-1).into_value(ValueType::Counter64).is_err());
        assert!(SetValue::from("ten").into_value(ValueType::Integer).is_err());
    }

    #[test]
    fn test_into_value_address_and_string() {
        assert_eq!(
            SetValue::from("10.1.2.3").into_value(ValueType::IpAddress).unwrap(),
            Value::IpAddress([10, 1, 2, 3])
        );
        assert_eq!(
            SetValue::from(&[192u8, 168, 0, 1][..])
                .into_value(ValueType::IpAddress)
                .unwrap(),
            Value::IpAddress([192, 168, 0, 1])
        );
        assert!(SetValue::from("nope").into_value(ValueType::IpAddress).is_err());
        assert_eq!(
            SetValue::from("10.1.2.3").into_value(ValueType::OctetString).unwrap(),
            Value::from("10.1.2.3")
        );
        assert!(SetValue::from(1).into_value(ValueType::OctetString).is_err());
    }
}
