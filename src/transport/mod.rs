//! Transport layer abstraction.
//!
//! Provides the `Transport` trait, the UDP transport used against real
//! agents and [`MockAgent`], an in-memory agent for tests and demos.

mod mock;
mod udp;

pub use mock::*;
pub use udp::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// Client-side transport abstraction.
///
/// # Clone Requirement
///
/// Walk streams own a clone of the client and thus of the transport.
/// Implementations keep their state behind an `Arc` so cloning is a
/// reference count increment.
pub trait Transport: Send + Sync + Clone {
    /// Send one request datagram to the peer.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for the next response datagram.
    ///
    /// `request_id` is informational; the client validates the response
    /// itself. Returns the datagram and the address it came from.
    fn recv(
        &self,
        request_id: i32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The agent address requests are sent to.
    fn peer_addr(&self) -> SocketAddr;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;
}
