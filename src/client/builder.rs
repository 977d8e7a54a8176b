//! Builders for SNMP clients and sessions.
//!
//! One builder per protocol version, so options that only make sense for
//! one version (GETBULK `max_repetitions` on v2c) are not offered on the
//! other. Each builder finishes either as an async [`Client`] or as a
//! blocking [`Session`].
//!
//! # Entry Points
//!
//! - [`Client::v1()`] / [`Session::v1()`] - SNMPv1 with community string
//! - [`Client::v2c()`] / [`Session::v2c()`] - SNMPv2c with community string
//!
//! # Examples
//!
//! ```rust,no_run
//! # use snmp_tables::Client;
//! # use std::time::Duration;
//! # async fn example() -> snmp_tables::Result<()> {
//! let client = Client::v2c("192.168.1.1")
//!     .community(b"private")
//!     .timeout(Duration::from_secs(3))
//!     .retries(2)
//!     .connect()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::session::Session;
use crate::transport::{Transport, UdpTransport};
use crate::version::Version;

use super::{Client, ClientConfig, WalkMode};

/// Well-known SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Common configuration shared by all builder types.
struct BaseConfig {
    target: String,
    port: u16,
    community: Bytes,
    timeout: Duration,
    retries: u32,
    walk_mode: WalkMode,
}

impl BaseConfig {
    fn new(target: impl Into<String>) -> Self {
        let defaults = ClientConfig::default();
        Self {
            target: target.into(),
            port: DEFAULT_PORT,
            community: defaults.community,
            timeout: defaults.timeout,
            retries: defaults.retries,
            walk_mode: defaults.walk_mode,
        }
    }

    /// Resolve the target.
    ///
    /// A target that already carries a port (`"10.0.0.1:1161"`,
    /// `"[::1]:1161"`) keeps it; a bare host name or address gets the
    /// configured port.
    fn resolve_target(&self) -> Result<SocketAddr> {
        if let Ok(addr) = self.target.parse::<SocketAddr>() {
            return Ok(addr);
        }
        (self.target.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::Io {
                target: None,
                source: e,
            })?
            .next()
            .ok_or_else(|| Error::Io {
                target: None,
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("could not resolve address {:?}", self.target),
                ),
            })
    }

    fn config(self, version: Version, max_repetitions: u32) -> ClientConfig {
        ClientConfig {
            version,
            community: self.community,
            timeout: self.timeout,
            retries: self.retries,
            max_repetitions,
            walk_mode: self.walk_mode,
        }
    }
}

// Macro to implement common builder methods
macro_rules! impl_common_methods {
    ($builder:ty) => {
        impl $builder {
            /// Set the community string (default `public`).
            pub fn community(mut self, community: &[u8]) -> Self {
                self.base.community = Bytes::copy_from_slice(community);
                self
            }

            /// Set the agent port used when the target has none (default 161).
            pub fn port(mut self, port: u16) -> Self {
                self.base.port = port;
                self
            }

            /// Set the per-attempt response timeout (default 1 s).
            pub fn timeout(mut self, timeout: Duration) -> Self {
                self.base.timeout = timeout;
                self
            }

            /// Set the number of retries after a timeout (default 5).
            pub fn retries(mut self, retries: u32) -> Self {
                self.base.retries = retries;
                self
            }

            /// Set how walks and table fetches traverse a subtree.
            pub fn walk_mode(mut self, mode: WalkMode) -> Self {
                self.base.walk_mode = mode;
                self
            }

            /// Resolve the target and connect a UDP client.
            pub async fn connect(self) -> Result<Client<UdpTransport>> {
                let addr = self.base.resolve_target()?;
                let transport = UdpTransport::connect(addr).await?;
                Ok(self.build(transport))
            }

            /// Connect a UDP session on its own single-threaded runtime.
            ///
            /// Must not be called from inside a tokio runtime.
            pub fn connect_blocking(self) -> Result<Session<UdpTransport>> {
                let runtime = Session::<UdpTransport>::runtime()?;
                let client = runtime.block_on(self.connect())?;
                Ok(Session::from_parts(runtime, client))
            }

            /// Build a blocking session over a pre-supplied transport.
            pub fn build_blocking<T: Transport>(self, transport: T) -> Result<Session<T>> {
                let runtime = Session::<T>::runtime()?;
                Ok(Session::from_parts(runtime, self.build(transport)))
            }
        }
    };
}

// ============================================================================
// V1 Client Builder
// ============================================================================

/// Builder for SNMPv1 clients.
///
/// Created via [`Client::v1()`] or [`Session::v1()`]. Walks always use
/// GETNEXT; asking for [`WalkMode::GetBulk`] makes walks fail with
/// [`Error::InvalidConfig`].
pub struct V1ClientBuilder {
    base: BaseConfig,
}

impl V1ClientBuilder {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::new(target),
        }
    }

    /// Build client with a pre-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Client<T> {
        let max_repetitions = ClientConfig::default().max_repetitions;
        Client::new(transport, self.base.config(Version::V1, max_repetitions))
    }
}

impl_common_methods!(V1ClientBuilder);

// ============================================================================
// V2c Client Builder
// ============================================================================

/// Builder for SNMPv2c clients.
///
/// Created via [`Client::v2c()`] or [`Session::v2c()`].
pub struct V2cClientBuilder {
    base: BaseConfig,
    max_repetitions: u32,
}

impl V2cClientBuilder {
    pub(crate) fn new(target: impl Into<String>) -> Self {
        Self {
            base: BaseConfig::new(target),
            max_repetitions: ClientConfig::default().max_repetitions,
        }
    }

    /// Set GETBULK max-repetitions for walks (default 20). Walks treat 0
    /// as 1.
    pub fn max_repetitions(mut self, max_repetitions: u32) -> Self {
        self.max_repetitions = max_repetitions;
        self
    }

    /// Build client with a pre-supplied transport.
    pub fn build<T: Transport>(self, transport: T) -> Client<T> {
        Client::new(
            transport,
            self.base.config(Version::V2c, self.max_repetitions),
        )
    }
}

impl_common_methods!(V2cClientBuilder);

// ============================================================================
// Entry points on Client
// ============================================================================

impl Client<UdpTransport> {
    /// Create an SNMPv1 client builder.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use snmp_tables::Client;
    /// # async fn example() -> snmp_tables::Result<()> {
    /// let client = Client::v1("192.168.1.1")
    ///     .community(b"public")
    ///     .connect()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn v1(target: impl Into<String>) -> V1ClientBuilder {
        V1ClientBuilder::new(target)
    }

    /// Create an SNMPv2c client builder.
    pub fn v2c(target: impl Into<String>) -> V2cClientBuilder {
        V2cClientBuilder::new(target)
    }
}
