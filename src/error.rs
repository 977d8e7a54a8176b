//! Error types for snmp-tables.
//!
//! All errors are `#[non_exhaustive]` so new variants are not breaking.

use std::net::SocketAddr;
use std::time::Duration;

use crate::codec::ValueType;
use crate::oid::Oid;
use crate::version::Version;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data ended mid-value.
    TruncatedData,
    /// Indefinite length (0x80) is not allowed.
    IndefiniteLength,
    /// Integer value does not fit its type.
    IntegerOverflow,
    /// Integer content has no octets.
    ZeroLengthInteger,
    /// Integer content longer than any valid encoding.
    IntegerTooLong { length: usize },
    /// Unknown SNMP version number.
    UnknownVersion(i32),
    /// Unknown PDU tag.
    UnknownPduType(u8),
    /// Constructed OCTET STRING.
    ConstructedOctetString,
    /// NULL with non-zero length.
    InvalidNull,
    /// IpAddress content not 4 octets.
    InvalidIpAddressLength { length: usize },
    /// Long-form length with too many octets.
    LengthTooLong { octets: usize },
    /// Length above the decoder limit.
    LengthExceedsMax { length: usize, max: usize },
    /// Fewer octets left than the length claims.
    InsufficientData { needed: usize, available: usize },
    /// OID exceeds the arc limit.
    OidTooLong { count: usize, max: usize },
    /// Bytes left over after a complete message.
    TrailingData { length: usize },
    /// Response carries no variable bindings.
    EmptyResponse,
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::IndefiniteLength => write!(f, "indefinite length encoding not supported"),
            Self::IntegerOverflow => write!(f, "integer overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::IntegerTooLong { length } => write!(f, "integer too long: {} bytes", length),
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version: {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type: 0x{:02X}", t),
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING (0x24) not supported")
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "IP address must be 4 bytes, got {}", length)
            }
            Self::LengthTooLong { octets } => {
                write!(f, "length encoding too long ({} octets)", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes but only {} remaining", needed, available)
            }
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
            Self::TrailingData { length } => write!(f, "{} trailing bytes after message", length),
            Self::EmptyResponse => write!(f, "response has no variable bindings"),
        }
    }
}

/// OID validation error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OidErrorKind {
    /// Empty OID string.
    Empty,
    /// Component is not a decimal u32.
    InvalidArc,
    /// More arcs than [`MAX_OID_LEN`](crate::oid::MAX_OID_LEN).
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty OID"),
            Self::InvalidArc => write!(f, "invalid arc value"),
            Self::TooManyArcs { count, max } => {
                write!(f, "OID has {} arcs, exceeds maximum {}", count, max)
            }
        }
    }
}

/// SNMP error status codes (RFC 3416).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    NoError,
    TooBig,
    NoSuchName,
    BadValue,
    ReadOnly,
    GenErr,
    NoAccess,
    WrongType,
    WrongLength,
    WrongEncoding,
    WrongValue,
    NoCreation,
    InconsistentValue,
    ResourceUnavailable,
    CommitFailed,
    UndoFailed,
    AuthorizationError,
    NotWritable,
    InconsistentName,
    /// Unknown/future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    const NAMED: [(i32, ErrorStatus, &'static str); 19] = [
        (0, Self::NoError, "noError"),
        (1, Self::TooBig, "tooBig"),
        (2, Self::NoSuchName, "noSuchName"),
        (3, Self::BadValue, "badValue"),
        (4, Self::ReadOnly, "readOnly"),
        (5, Self::GenErr, "genErr"),
        (6, Self::NoAccess, "noAccess"),
        (7, Self::WrongType, "wrongType"),
        (8, Self::WrongLength, "wrongLength"),
        (9, Self::WrongEncoding, "wrongEncoding"),
        (10, Self::WrongValue, "wrongValue"),
        (11, Self::NoCreation, "noCreation"),
        (12, Self::InconsistentValue, "inconsistentValue"),
        (13, Self::ResourceUnavailable, "resourceUnavailable"),
        (14, Self::CommitFailed, "commitFailed"),
        (15, Self::UndoFailed, "undoFailed"),
        (16, Self::AuthorizationError, "authorizationError"),
        (17, Self::NotWritable, "notWritable"),
        (18, Self::InconsistentName, "inconsistentName"),
    ];

    /// Create from the wire code.
    pub fn from_i32(value: i32) -> Self {
        Self::NAMED
            .iter()
            .find(|(code, _, _)| *code == value)
            .map(|(_, status, _)| *status)
            .unwrap_or(Self::Unknown(value))
    }

    /// The wire code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Unknown(code) => *code,
            known => Self::NAMED
                .iter()
                .find(|(_, status, _)| status == known)
                .map_or(-1, |(code, _, _)| *code),
        }
    }

    /// Whether an agent uses this status to reject a SET because of the
    /// value or its type rather than access rights.
    pub fn is_value_rejection(&self) -> bool {
        matches!(
            self,
            Self::BadValue
                | Self::WrongType
                | Self::WrongLength
                | Self::WrongEncoding
                | Self::WrongValue
                | Self::InconsistentValue
        )
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({})", code),
            known => {
                let name = Self::NAMED
                    .iter()
                    .find(|(_, status, _)| status == known)
                    .map_or("unknown", |(_, _, name)| *name);
                f.write_str(name)
            }
        }
    }
}

fn peer(target: &Option<SocketAddr>, preposition: &str) -> String {
    target
        .map(|t| format!(" {} {}", preposition, t))
        .unwrap_or_default()
}

/// Library error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during communication or address resolution.
    #[error("I/O error{}: {source}", peer(target, "communicating with"))]
    Io {
        target: Option<SocketAddr>,
        #[source]
        source: std::io::Error,
    },

    /// No response after all retries.
    #[error("timeout after {elapsed:?}{} (request_id={request_id}, retries={retries})", peer(target, "waiting for"))]
    Timeout {
        target: Option<SocketAddr>,
        elapsed: Duration,
        request_id: i32,
        retries: u32,
    },

    /// Error status returned by the agent that has no more specific variant.
    #[error("SNMP error{}: {status} at index {index}", peer(target, "from"))]
    Snmp {
        target: Option<SocketAddr>,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// The agent has no object or instance at this OID.
    #[error("no such object{}: {oid}", peer(target, "at"))]
    NoSuchObject {
        target: Option<SocketAddr>,
        oid: Oid,
    },

    /// The agent rejected a SET because of the value or its type.
    #[error("SET of {oid} rejected{}: {status}", peer(target, "by"))]
    BadValueType {
        target: Option<SocketAddr>,
        oid: Oid,
        status: ErrorStatus,
    },

    /// Codec input has the wrong number of octets.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// A SET value cannot be represented in the requested type.
    #[error("cannot encode value as {value_type}: {reason}")]
    InvalidSetValue {
        value_type: ValueType,
        reason: Box<str>,
    },

    /// Unrecognized SET type name.
    #[error("unknown value type: {name}")]
    UnknownValueType { name: Box<str> },

    /// Inconsistent table specification.
    #[error("invalid table spec: {reason}")]
    InvalidTableSpec { reason: Box<str> },

    /// Inconsistent client configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: &'static str },

    /// Invalid OID format.
    #[error("invalid OID{}: {kind}", input.as_ref().map(|i| format!(" {:?}", i)).unwrap_or_default())]
    InvalidOid {
        kind: OidErrorKind,
        input: Option<Box<str>>,
    },

    /// BER decoding error.
    #[error("decode error at offset {offset}: {kind}")]
    Decode {
        offset: usize,
        kind: DecodeErrorKind,
    },

    /// Response request ID doesn't match.
    #[error("request ID mismatch: expected {expected}, got {actual}")]
    RequestIdMismatch { expected: i32, actual: i32 },

    /// Response version doesn't match request.
    #[error("version mismatch: expected {expected:?}, got {actual:?}")]
    VersionMismatch { expected: Version, actual: Version },

    /// A walk received an OID not greater than the previous one.
    ///
    /// Continuing would loop forever on a misbehaving agent.
    #[error("walk detected non-increasing OID: {previous} >= {current}")]
    NonIncreasingOid { previous: Oid, current: Oid },
}

impl Error {
    /// Create a decode error.
    pub fn decode(offset: usize, kind: DecodeErrorKind) -> Self {
        Self::Decode { offset, kind }
    }

    /// Create an invalid OID error with the input string that failed.
    pub fn invalid_oid_with_input(kind: OidErrorKind, input: impl Into<Box<str>>) -> Self {
        Self::InvalidOid {
            kind,
            input: Some(input.into()),
        }
    }

    pub(crate) fn invalid_set_value(value_type: ValueType, reason: impl Into<Box<str>>) -> Self {
        Self::InvalidSetValue {
            value_type,
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_table_spec(reason: impl Into<Box<str>>) -> Self {
        Self::InvalidTableSpec {
            reason: reason.into(),
        }
    }

    /// Get the target address if this error has one.
    pub fn target(&self) -> Option<SocketAddr> {
        match self {
            Self::Io { target, .. }
            | Self::Timeout { target, .. }
            | Self::Snmp { target, .. }
            | Self::NoSuchObject { target, .. }
            | Self::BadValueType { target, .. } => *target,
            _ => None,
        }
    }

    /// Whether this is a failure below SNMP semantics: socket errors or a
    /// response that could not be parsed or matched to its request.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io { .. }
                | Self::Decode { .. }
                | Self::RequestIdMismatch { .. }
                | Self::VersionMismatch { .. }
        )
    }

    /// Attach a peer address to errors raised before it was known.
    pub(crate) fn with_target(mut self, peer: SocketAddr) -> Self {
        if let Self::Io { target, .. }
        | Self::Timeout { target, .. }
        | Self::Snmp { target, .. }
        | Self::NoSuchObject { target, .. }
        | Self::BadValueType { target, .. } = &mut self
            && target.is_none()
        {
            *target = Some(peer);
        }
        self
    }
}
