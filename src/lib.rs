// The Error enum carries OIDs inline for diagnostics.
#![allow(clippy::result_large_err)]

//! # snmp-tables
//!
//! SNMP v1/v2c convenience layer for scripts and small tools.
//!
//! The crate fetches scalar values, writes them back with explicit or
//! inferred types, and turns a subtree walk into a row/column [`Table`]
//! so callers never have to regroup `(oid, value)` pairs by hand.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snmp_tables::{Session, TableSpec};
//!
//! fn main() -> snmp_tables::Result<()> {
//!     let session = Session::v2c("192.168.1.1")
//!         .community(b"public")
//!         .connect_blocking()?;
//!
//!     let descr = session.get("1.3.6.1.2.1.1.1.0")?;
//!     println!("sysDescr: {descr}");
//!
//!     let spec = TableSpec::new("1.3.6.1.2.1.2.2.1")?
//!         .column(2, "descr")
//!         .column(6, "mac")
//!         .fetch_all_columns(false);
//!     let table = session.table(&spec)?;
//!     for row in table.rows() {
//!         println!("{} {:?}", row.id(), row.get("descr"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Async use
//!
//! [`Session`] blocks the calling thread. Code already running on tokio
//! should use [`Client`] directly; it exposes the same operations as
//! futures and streams.

pub mod ber;
pub mod client;
pub mod codec;
pub mod error;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod prelude;
pub mod session;
pub mod table;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::{
    BulkWalk, Client, ClientConfig, V1ClientBuilder, V2cClientBuilder, Walk, WalkMode,
};
pub use codec::{SetValue, ValueType};
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use oid::{IntoOid, Oid};
pub use pdu::{Pdu, PduType};
pub use session::Session;
pub use table::{Column, Row, RowId, Table, TableSpec};
pub use transport::{MockAgent, Transport, UdpTransport};
pub use value::{Native, Value};
pub use varbind::VarBind;
pub use version::Version;

/// Client using a dedicated UDP socket.
pub type UdpClient = Client<UdpTransport>;
