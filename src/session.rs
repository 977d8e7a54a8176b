//! Blocking session facade over [`Client`].
//!
//! A [`Session`] owns a single-threaded tokio runtime and drives the async
//! client on it, so scripts and CLI tools can fetch values and tables
//! without writing any async code.
//!
//! ```rust,no_run
//! use snmp_tables::{Session, ValueType};
//!
//! # fn main() -> snmp_tables::Result<()> {
//! let session = Session::v2c("192.168.1.1")
//!     .community(b"private")
//!     .connect_blocking()?;
//!
//! let uptime = session.get("1.3.6.1.2.1.1.3.0")?;
//! session.set("1.3.6.1.2.1.1.5.0", "core-sw-01", None)?;
//! session.set("1.3.6.1.4.1.9999.1.0", 42, Some(ValueType::Gauge32))?;
//! # Ok(())
//! # }
//! ```

use tokio::runtime::Runtime;

use crate::client::{Client, V1ClientBuilder, V2cClientBuilder};
use crate::codec::{SetValue, ValueType};
use crate::error::{Error, Result};
use crate::oid::IntoOid;
use crate::table::{Table, TableSpec};
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;

/// Blocking SNMP session bound to one agent.
///
/// Every method blocks the calling thread until the operation completes.
/// A session must not be used from inside another tokio runtime.
pub struct Session<T: Transport = UdpTransport> {
    runtime: Runtime,
    client: Client<T>,
}

impl Session<UdpTransport> {
    /// Create an SNMPv1 session builder.
    pub fn v1(target: impl Into<String>) -> V1ClientBuilder {
        Client::v1(target)
    }

    /// Create an SNMPv2c session builder.
    pub fn v2c(target: impl Into<String>) -> V2cClientBuilder {
        Client::v2c(target)
    }

    /// Connect an SNMPv2c session with community `public` and default
    /// timeouts.
    pub fn connect(target: impl Into<String>) -> Result<Self> {
        Client::v2c(target).connect_blocking()
    }
}

impl<T: Transport> Session<T> {
    pub(crate) fn runtime() -> Result<Runtime> {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Io {
                target: None,
                source: e,
            })
    }

    pub(crate) fn from_parts(runtime: Runtime, client: Client<T>) -> Self {
        Self { runtime, client }
    }

    /// The async client this session drives.
    pub fn client(&self) -> &Client<T> {
        &self.client
    }
}

impl<T: Transport + 'static> Session<T> {
    /// GET a single value.
    ///
    /// A missing object is [`Error::NoSuchObject`].
    pub fn get(&self, oid: impl IntoOid) -> Result<Value> {
        let oid = oid.into_oid()?;
        self.runtime.block_on(self.client.get(&oid))
    }

    /// SET a single value and return the value the agent echoed.
    ///
    /// Without `value_type` the type is inferred from the value: integers
    /// become `Integer`, text that parses as a dotted IPv4 address becomes
    /// `IpAddress`, other text and bytes become `OctetString`.
    pub fn set(
        &self,
        oid: impl IntoOid,
        value: impl Into<SetValue>,
        value_type: Option<ValueType>,
    ) -> Result<Value> {
        let oid = oid.into_oid()?;
        self.runtime
            .block_on(self.client.set_value(&oid, value.into(), value_type))
    }

    /// Walk a subtree and return every binding in ascending OID order.
    pub fn walk(&self, oid: impl IntoOid) -> Result<Vec<VarBind>> {
        let oid = oid.into_oid()?;
        self.runtime.block_on(self.client.walk_all(oid))
    }

    /// Fetch and assemble a conceptual table.
    pub fn table(&self, spec: &TableSpec) -> Result<Table> {
        self.runtime.block_on(self.client.table(spec))
    }
}

impl<T: Transport> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.client.peer_addr())
            .field("version", &self.client.config().version)
            .finish()
    }
}
