//! Async SNMP client.
//!
//! [`Client`] sends v1/v2c requests over any [`Transport`], retries on
//! timeout, validates each response against its request and maps agent
//! error statuses to typed [`Error`] variants. Walks are exposed both as
//! streams ([`Walk`], [`BulkWalk`]) and collected ([`Client::walk_all`]).

mod builder;
mod walk;

pub use builder::{DEFAULT_PORT, V1ClientBuilder, V2cClientBuilder};
pub use walk::{BulkWalk, Walk};

use crate::codec::{SetValue, ValueType};
use crate::error::{DecodeErrorKind, Error, ErrorStatus, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::Pdu;
use crate::table::{Table, TableSpec};
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use futures_core::Stream;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};
use tracing::{Span, instrument};

/// Walk operation mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkMode {
    /// GETBULK on v2c, GETNEXT on v1 (default).
    #[default]
    Auto,
    /// Always use GETNEXT.
    GetNext,
    /// Always use GETBULK; walks fail with [`Error::InvalidConfig`] on v1.
    GetBulk,
}

/// SNMP client.
///
/// Cheap to clone; clones share the transport and request-ID counter.
#[derive(Clone)]
pub struct Client<T: Transport = UdpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    transport: T,
    config: ClientConfig,
    request_id: AtomicI32,
}

/// Client configuration.
///
/// Most users should use the builders ([`Client::v2c`], [`Client::v1`])
/// rather than constructing this directly.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SNMP version (default: V2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Per-attempt response timeout (default: 1 second)
    pub timeout: Duration,
    /// Retries after a timeout (default: 5)
    pub retries: u32,
    /// GETBULK max-repetitions for walks (default: 20)
    pub max_repetitions: u32,
    /// Walk operation mode (default: Auto)
    pub walk_mode: WalkMode,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: Duration::from_secs(1),
            retries: 5,
            max_repetitions: 20,
            walk_mode: WalkMode::Auto,
        }
    }
}

/// Random positive starting point for request IDs, so restarts do not
/// reuse the previous run's IDs.
fn initial_request_id() -> i32 {
    let mut buf = [0u8; 4];
    match getrandom::fill(&mut buf) {
        Ok(()) => (i32::from_ne_bytes(buf) & i32::MAX).max(1),
        Err(e) => {
            tracing::debug!(target: "snmp_tables::client", error = %e, "no OS randomness, request IDs start at 1");
            1
        }
    }
}

impl<T: Transport> Client<T> {
    /// Create a new client with the given transport and config.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                request_id: AtomicI32::new(initial_request_id()),
            }),
        }
    }

    /// The agent address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.transport.peer_addr()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Next request ID, always in `1..=i32::MAX`.
    fn next_request_id(&self) -> i32 {
        let id = self.inner.request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX;
        id.max(1)
    }

    /// Send a request and wait for its response, retrying on timeout.
    #[instrument(
        level = "debug",
        skip(self, data),
        fields(
            snmp.target = %self.peer_addr(),
            snmp.request_id = request_id,
            snmp.attempt = tracing::field::Empty,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    async fn send_and_recv(&self, request_id: i32, data: &[u8]) -> Result<Pdu> {
        let start = Instant::now();
        let retries = self.inner.config.retries;
        let peer = self.peer_addr();

        for attempt in 0..=retries {
            Span::current().record("snmp.attempt", attempt);
            if attempt > 0 {
                tracing::debug!(target: "snmp_tables::client", { snmp.attempt = attempt }, "retrying request");
            }

            tracing::trace!(target: "snmp_tables::client", { snmp.bytes = data.len() }, "sending request");
            self.inner
                .transport
                .send(data)
                .await
                .map_err(|e| e.with_target(peer))?;

            match self
                .inner
                .transport
                .recv(request_id, self.inner.config.timeout)
                .await
            {
                Ok((response_data, _source)) => {
                    tracing::trace!(target: "snmp_tables::client", { snmp.bytes = response_data.len() }, "received response");
                    Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
                    return self.validate_response(request_id, response_data);
                }
                Err(Error::Timeout { .. }) => continue,
                Err(e) => return Err(e.with_target(peer)),
            }
        }

        let elapsed = start.elapsed();
        Span::current().record("snmp.elapsed_ms", elapsed.as_millis() as u64);
        tracing::warn!(target: "snmp_tables::client", { snmp.request_id = request_id, snmp.target = %peer, ?elapsed, retries }, "request timed out");
        Err(Error::Timeout {
            target: Some(peer),
            elapsed,
            request_id,
            retries,
        })
    }

    /// Check version and request ID, then turn an error status into an
    /// [`Error::Snmp`].
    fn validate_response(&self, request_id: i32, data: Bytes) -> Result<Pdu> {
        let response = CommunityMessage::decode(data)?;

        let expected = self.inner.config.version;
        if response.version != expected {
            tracing::warn!(target: "snmp_tables::client", { expected = ?expected, actual = ?response.version, snmp.target = %self.peer_addr() }, "version mismatch in response");
            return Err(Error::VersionMismatch {
                expected,
                actual: response.version,
            });
        }

        let pdu = response.into_pdu();
        if pdu.request_id != request_id {
            tracing::warn!(target: "snmp_tables::client", { expected = request_id, actual = pdu.request_id, snmp.target = %self.peer_addr() }, "request ID mismatch in response");
            return Err(Error::RequestIdMismatch {
                expected: request_id,
                actual: pdu.request_id,
            });
        }

        if pdu.is_error() {
            return Err(Error::Snmp {
                target: Some(self.peer_addr()),
                status: pdu.error_status_enum(),
                index: u32::try_from(pdu.error_index).unwrap_or(0),
                oid: pdu.error_oid().cloned(),
            });
        }
        Ok(pdu)
    }

    async fn send_request(&self, pdu: Pdu) -> Result<Pdu> {
        tracing::debug!(target: "snmp_tables::client", { snmp.pdu_type = %pdu.pdu_type, snmp.varbind_count = pdu.varbinds.len() }, "sending {} request", pdu.pdu_type);

        let request_id = pdu.request_id;
        let message = CommunityMessage::new(
            self.inner.config.version,
            self.inner.config.community.clone(),
            pdu,
        );
        let response = self.send_and_recv(request_id, &message.encode()).await?;

        tracing::debug!(target: "snmp_tables::client", { snmp.varbind_count = response.varbinds.len() }, "received {} response", response.pdu_type);
        for vb in &response.varbinds {
            tracing::trace!(target: "snmp_tables::client", { snmp.oid = %vb.oid }, "{}", vb.value);
        }
        Ok(response)
    }

    fn first_varbind(&self, response: Pdu) -> Result<VarBind> {
        response.varbinds.into_iter().next().ok_or_else(|| {
            tracing::debug!(target: "snmp_tables::client", { snmp.target = %self.peer_addr() }, "empty response");
            Error::decode(0, DecodeErrorKind::EmptyResponse)
        })
    }

    /// GET a single OID.
    ///
    /// Missing objects fail with [`Error::NoSuchObject`], whether the agent
    /// reports them with a v2c exception value or a v1 noSuchName status.
    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<Value> {
        let no_such_object = || Error::NoSuchObject {
            target: Some(self.peer_addr()),
            oid: oid.clone(),
        };

        let pdu = Pdu::get_request(self.next_request_id(), std::slice::from_ref(oid));
        let response = match self.send_request(pdu).await {
            Err(Error::Snmp {
                status: ErrorStatus::NoSuchName,
                ..
            }) => return Err(no_such_object()),
            other => other?,
        };

        let vb = self.first_varbind(response)?;
        if vb.value.is_exception() {
            return Err(no_such_object());
        }
        Ok(vb.value)
    }

    /// GETNEXT a single OID.
    ///
    /// The returned binding may be an `EndOfMibView` exception (v2c); on v1
    /// the end of the MIB arrives as an [`Error::Snmp`] with noSuchName.
    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let pdu = Pdu::get_next_request(self.next_request_id(), std::slice::from_ref(oid));
        let response = self.send_request(pdu).await?;
        self.first_varbind(response)
    }

    /// GETBULK (v2c only).
    #[instrument(skip(self, oids), err, fields(
        snmp.target = %self.peer_addr(),
        snmp.oid_count = oids.len(),
        snmp.non_repeaters = non_repeaters,
        snmp.max_repetitions = max_repetitions
    ))]
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<VarBind>> {
        if !self.inner.config.version.supports_bulk() {
            return Err(Error::InvalidConfig {
                reason: "GETBULK is not available in SNMPv1",
            });
        }
        let pdu = Pdu::get_bulk(self.next_request_id(), non_repeaters, max_repetitions, oids);
        Ok(self.send_request(pdu).await?.varbinds)
    }

    /// SET a single OID to an already-typed value.
    ///
    /// Returns the value echoed by the agent. Rejections on value or type
    /// grounds fail with [`Error::BadValueType`]; a missing object (v1
    /// noSuchName, v2c noCreation) fails with [`Error::NoSuchObject`].
    #[instrument(skip(self, value), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn set(&self, oid: &Oid, value: Value) -> Result<Value> {
        let pdu = Pdu::set_request(
            self.next_request_id(),
            vec![VarBind::new(oid.clone(), value)],
        );
        let response = match self.send_request(pdu).await {
            Ok(response) => response,
            Err(Error::Snmp { target, status, .. }) if status.is_value_rejection() => {
                return Err(Error::BadValueType {
                    target,
                    oid: oid.clone(),
                    status,
                });
            }
            Err(Error::Snmp {
                target,
                status: ErrorStatus::NoSuchName | ErrorStatus::NoCreation,
                ..
            }) => {
                return Err(Error::NoSuchObject {
                    target,
                    oid: oid.clone(),
                });
            }
            Err(e) => return Err(e),
        };
        Ok(self.first_varbind(response)?.value)
    }

    /// SET with an explicit or inferred type.
    ///
    /// The value is converted before any request is sent, so a value that
    /// does not fit `value_type` fails with [`Error::InvalidSetValue`]
    /// without touching the agent.
    pub async fn set_value(
        &self,
        oid: &Oid,
        value: SetValue,
        value_type: Option<ValueType>,
    ) -> Result<Value> {
        let value_type = value_type.unwrap_or_else(|| value.inferred_type());
        tracing::debug!(target: "snmp_tables::client", { snmp.oid = %oid, snmp.value_type = %value_type }, "encoding SET value");
        let value = value.into_value(value_type)?;
        self.set(oid, value).await
    }

    /// Walk a subtree with GETNEXT, one request per binding.
    pub fn walk(&self, oid: Oid) -> Walk<T>
    where
        T: 'static,
    {
        Walk::new(self.clone(), oid)
    }

    /// Walk a subtree with GETBULK.
    pub fn bulk_walk(&self, oid: Oid, max_repetitions: i32) -> BulkWalk<T>
    where
        T: 'static,
    {
        BulkWalk::new(self.clone(), oid, max_repetitions)
    }

    /// Walk mode after resolving `Auto` against the version.
    fn effective_walk_mode(&self) -> Result<WalkMode> {
        let bulk = self.inner.config.version.supports_bulk();
        match self.inner.config.walk_mode {
            WalkMode::Auto if bulk => Ok(WalkMode::GetBulk),
            WalkMode::Auto | WalkMode::GetNext => Ok(WalkMode::GetNext),
            WalkMode::GetBulk if bulk => Ok(WalkMode::GetBulk),
            WalkMode::GetBulk => Err(Error::InvalidConfig {
                reason: "GETBULK walk mode requires SNMPv2c",
            }),
        }
    }

    /// Walk a subtree and collect every binding in ascending OID order.
    ///
    /// Uses GETBULK or GETNEXT according to the configured [`WalkMode`].
    /// The first error discards everything collected so far.
    pub async fn walk_all(&self, oid: Oid) -> Result<Vec<VarBind>>
    where
        T: 'static,
    {
        self.walk_collect(oid, None).await
    }

    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    async fn walk_collect(&self, oid: Oid, max_repetitions: Option<u32>) -> Result<Vec<VarBind>>
    where
        T: 'static,
    {
        let varbinds = match self.effective_walk_mode()? {
            WalkMode::GetBulk => {
                let reps = max_repetitions.unwrap_or(self.inner.config.max_repetitions);
                let reps = i32::try_from(reps).unwrap_or(i32::MAX);
                collect(self.bulk_walk(oid, reps)).await?
            }
            _ => collect(self.walk(oid)).await?,
        };
        tracing::debug!(target: "snmp_tables::client", { snmp.varbind_count = varbinds.len() }, "walk complete");
        Ok(varbinds)
    }

    /// Fetch and assemble a conceptual table.
    ///
    /// Fetch-all specs walk the table's base once. Sparse specs walk each
    /// declared column in declaration order. Any walk error aborts the
    /// build.
    #[instrument(skip(self, spec), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %spec.base()))]
    pub async fn table(&self, spec: &TableSpec) -> Result<Table>
    where
        T: 'static,
    {
        spec.validate()?;
        let reps = spec.max_repetitions_override();

        let table = if spec.fetches_all_columns() {
            let varbinds = self.walk_collect(spec.base().clone(), reps).await?;
            Table::from_walk(spec, varbinds)?
        } else {
            let mut walks = Vec::with_capacity(spec.declared_columns().len());
            for (id, _) in spec.declared_columns() {
                let varbinds = self.walk_collect(spec.base().child(*id), reps).await?;
                walks.push((*id, varbinds));
            }
            Table::from_column_walks(spec, walks)?
        };

        tracing::debug!(target: "snmp_tables::table", { snmp.rows = table.len(), snmp.columns = table.columns().len() }, "table assembled");
        Ok(table)
    }
}

/// Drain a walk stream, stopping at the first error.
async fn collect<S>(stream: S) -> Result<Vec<VarBind>>
where
    S: Stream<Item = Result<VarBind>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut results = Vec::new();
    while let Some(item) = std::future::poll_fn(|cx| stream.as_mut().poll_next(cx)).await {
        results.push(item?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::transport::MockAgent;

    fn client(agent: &MockAgent, version: Version) -> Client<MockAgent> {
        let config = ClientConfig {
            version,
            retries: 1,
            ..ClientConfig::default()
        };
        Client::new(agent.clone(), config)
    }

    fn system() -> MockAgent {
        MockAgent::new()
            .with_object(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), "Linux router")
            .with_object(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(12_345))
            .with_object(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), "router1")
            .with_object(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(2))
    }

    #[tokio::test]
    async fn test_get() {
        let agent = system();
        let value = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap();
        assert_eq!(value, Value::from("router1"));
    }

    #[tokio::test]
    async fn test_get_missing_is_no_such_object_on_both_versions() {
        let agent = system();
        for version in [Version::V1, Version::V2c] {
            let err = client(&agent, version)
                .get(&oid!(1, 3, 6, 1, 2, 1, 1, 99, 0))
                .await
                .unwrap_err();
            assert!(
                matches!(&err, Error::NoSuchObject { oid, .. } if *oid == oid!(1, 3, 6, 1, 2, 1, 1, 99, 0)),
                "{version}: {err}"
            );
        }
    }

    #[tokio::test]
    async fn test_retry_after_timeout() {
        let agent = system();
        agent.fail_next_with_timeout();
        let value = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap();
        assert_eq!(value, Value::from("router1"));
        assert_eq!(agent.request_count(), 2);

        // retries reuse the request ID
        let requests = agent.requests();
        assert_eq!(requests[0].pdu.request_id, requests[1].pdu.request_id);
    }

    #[tokio::test]
    async fn test_timeout_after_retries_exhausted() {
        let agent = system();
        agent.fail_next_with_timeout();
        agent.fail_next_with_timeout();
        let err = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { retries: 1, .. }));
        assert_eq!(err.target(), Some(agent.peer_addr()));
    }

    #[tokio::test]
    async fn test_io_error_is_not_retried() {
        let agent = system();
        agent.fail_next_with_io_error("connection refused");
        let err = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert_eq!(agent.request_count(), 1);
    }

    #[tokio::test]
    async fn test_request_id_mismatch() {
        let agent = system();
        agent.respond_next_with(|request| Pdu {
            request_id: request.request_id.wrapping_add(1),
            ..request.response(Vec::new())
        });
        let err = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RequestIdMismatch { .. }));
    }

    #[tokio::test]
    async fn test_other_error_status_surfaces_as_snmp() {
        let agent = system();
        agent.respond_next_with(|request| request.error_response(ErrorStatus::GenErr, 1));
        let err = client(&agent, Version::V2c)
            .get(&oid!(1, 3, 6, 1, 2, 1, 1, 5, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Snmp {
                status: ErrorStatus::GenErr,
                index: 1,
                oid: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_set_value_inference_and_rejection() {
        let agent = system();
        let client = client(&agent, Version::V2c);
        let sys_name = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);

        let echoed = client
            .set_value(&sys_name, SetValue::from("router2"), None)
            .await
            .unwrap();
        assert_eq!(echoed, Value::from("router2"));
        assert_eq!(agent.object(&sys_name), Some(Value::from("router2")));

        // integer into a string object is a type rejection
        let err = client
            .set_value(&sys_name, SetValue::from(5), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::BadValueType {
                status: ErrorStatus::WrongType,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_set_value_unrepresentable_sends_nothing() {
        let agent = system();
        let err = client(&agent, Version::V2c)
            .set_value(
                &oid!(1, 3, 6, 1, 2, 1, 1, 3, 0),
                SetValue::from(-1),
                Some(ValueType::TimeTicks),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSetValue { .. }));
        assert_eq!(agent.request_count(), 0);
    }

    #[tokio::test]
    async fn test_walk_all_modes_agree() {
        let agent = system();
        let base = oid!(1, 3, 6, 1, 2, 1, 1);

        let v1 = client(&agent, Version::V1).walk_all(base.clone()).await.unwrap();
        let v2 = client(&agent, Version::V2c).walk_all(base).await.unwrap();
        assert_eq!(v1.len(), 3);
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_bulk_mode_rejected_on_v1() {
        let agent = system();
        let config = ClientConfig {
            version: Version::V1,
            walk_mode: WalkMode::GetBulk,
            ..ClientConfig::default()
        };
        let err = Client::new(agent.clone(), config)
            .walk_all(oid!(1, 3, 6, 1, 2, 1, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert_eq!(agent.request_count(), 0);
    }

    #[tokio::test]
    async fn test_version_mismatch() {
        let agent = system();
        let client = client(&agent, Version::V1);
        let message = CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::get_request(1, &[oid!(1, 3)]).response(Vec::new()),
        );
        assert!(matches!(
            client.validate_response(1, message.encode()),
            Err(Error::VersionMismatch {
                expected: Version::V1,
                actual: Version::V2c
            })
        ));
    }
}
