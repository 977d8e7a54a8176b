//! In-memory SNMP agent.
//!
//! [`MockAgent`] implements [`Transport`] by decoding each request and
//! answering it from an ordered object store, so client, session and table
//! code can be exercised end to end without a network. Faults (lost
//! datagrams, socket errors, rejected SETs, hand-written responses) are
//! scripted per request.

use super::Transport;
use crate::error::{Error, ErrorStatus, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::Arc;
use std::time::Duration;

type Responder = Box<dyn FnOnce(&Pdu) -> Pdu + Send>;

/// What happens to the next request.
enum Script {
    /// The request is dropped; the client sees a timeout.
    Drop,
    /// Receiving the response fails with an I/O error.
    Io(String),
    /// The response PDU is built by the closure instead of the store.
    Respond(Responder),
}

/// Outcome of a request, waiting for `recv`.
enum Pending {
    Datagram(Bytes),
    Lost,
    Io(String),
}

struct MockAgentInner {
    target: SocketAddr,
    community: Option<Bytes>,
    objects: BTreeMap<Oid, Value>,
    set_errors: HashMap<Oid, ErrorStatus>,
    scripts: VecDeque<Script>,
    pending: VecDeque<Pending>,
    requests: Vec<CommunityMessage>,
}

/// Scripted in-memory agent.
///
/// Clones share state, so a test can keep one handle for inspection while
/// a client owns another.
///
/// ```
/// use snmp_tables::{MockAgent, Value, oid};
///
/// let agent = MockAgent::new()
///     .with_object(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), "router1")
///     .with_object(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(12_345));
/// agent.fail_next_with_timeout();
/// assert_eq!(agent.len(), 2);
/// ```
#[derive(Clone)]
pub struct MockAgent {
    inner: Arc<Mutex<MockAgentInner>>,
}

impl Default for MockAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAgent {
    /// Empty agent at `127.0.0.1:161` accepting any community.
    pub fn new() -> Self {
        Self::with_target(SocketAddr::from(([127, 0, 0, 1], 161)))
    }

    pub fn with_target(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockAgentInner {
                target,
                community: None,
                objects: BTreeMap::new(),
                set_errors: HashMap::new(),
                scripts: VecDeque::new(),
                pending: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    /// Only answer requests carrying this community; others are dropped.
    pub fn with_community(self, community: &[u8]) -> Self {
        self.inner.lock().community = Some(Bytes::copy_from_slice(community));
        self
    }

    pub fn with_object(self, oid: Oid, value: impl Into<Value>) -> Self {
        self.insert(oid, value);
        self
    }

    pub fn with_objects<V: Into<Value>>(self, objects: impl IntoIterator<Item = (Oid, V)>) -> Self {
        {
            let mut inner = self.inner.lock();
            inner
                .objects
                .extend(objects.into_iter().map(|(oid, v)| (oid, v.into())));
        }
        self
    }

    /// Add or replace an object.
    pub fn insert(&self, oid: Oid, value: impl Into<Value>) {
        self.inner.lock().objects.insert(oid, value.into());
    }

    /// Current value of an object, reflecting applied SETs.
    pub fn object(&self, oid: &Oid) -> Option<Value> {
        self.inner.lock().objects.get(oid).cloned()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.inner.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().objects.is_empty()
    }

    /// Reject every SET of `oid` with `status`.
    pub fn reject_set(&self, oid: Oid, status: ErrorStatus) {
        self.inner.lock().set_errors.insert(oid, status);
    }

    /// Drop the next request without answering.
    pub fn fail_next_with_timeout(&self) {
        self.inner.lock().scripts.push_back(Script::Drop);
    }

    /// Fail receipt of the next response with an I/O error.
    pub fn fail_next_with_io_error(&self, msg: impl Into<String>) {
        self.inner.lock().scripts.push_back(Script::Io(msg.into()));
    }

    /// Answer the next request with a PDU built from it.
    ///
    /// The response is wrapped in a message with the request's version and
    /// community. The closure decides everything else, including the
    /// request ID.
    pub fn respond_next_with(&self, responder: impl FnOnce(&Pdu) -> Pdu + Send + 'static) {
        self.inner
            .lock()
            .scripts
            .push_back(Script::Respond(Box::new(responder)));
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<CommunityMessage> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn clear_requests(&self) {
        self.inner.lock().requests.clear();
    }
}

impl MockAgentInner {
    fn handle(&mut self, data: &[u8]) -> Pending {
        let Ok(request) = CommunityMessage::decode(Bytes::copy_from_slice(data)) else {
            return Pending::Lost;
        };
        self.requests.push(request.clone());

        let script = self.scripts.pop_front();
        if let Some(community) = &self.community
            && *community != request.community
        {
            return Pending::Lost;
        }

        let pdu = match script {
            Some(Script::Drop) => return Pending::Lost,
            Some(Script::Io(msg)) => return Pending::Io(msg),
            Some(Script::Respond(responder)) => responder(&request.pdu),
            None => self.answer(request.version, &request.pdu),
        };

        let response = CommunityMessage::new(request.version, request.community, pdu);
        Pending::Datagram(response.encode())
    }

    fn answer(&mut self, version: Version, request: &Pdu) -> Pdu {
        match request.pdu_type {
            PduType::GetRequest => self.get(version, request),
            PduType::GetNextRequest => self.get_next(version, request),
            PduType::GetBulkRequest if version.supports_bulk() => self.get_bulk(request),
            PduType::SetRequest => self.set(version, request),
            PduType::GetBulkRequest | PduType::Response => {
                request.error_response(ErrorStatus::GenErr, 0)
            }
        }
    }

    fn next_after(&self, oid: &Oid) -> Option<(&Oid, &Value)> {
        self.objects
            .range((Bound::Excluded(oid), Bound::Unbounded))
            .next()
    }

    fn get(&self, version: Version, request: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(request.varbinds.len());
        for (i, vb) in request.varbinds.iter().enumerate() {
            match self.objects.get(&vb.oid) {
                Some(value) => varbinds.push(VarBind::new(vb.oid.clone(), value.clone())),
                None if version.supports_bulk() => {
                    varbinds.push(VarBind::new(vb.oid.clone(), Value::NoSuchObject))
                }
                None => return request.error_response(ErrorStatus::NoSuchName, index(i)),
            }
        }
        request.response(varbinds)
    }

    fn get_next(&self, version: Version, request: &Pdu) -> Pdu {
        let mut varbinds = Vec::with_capacity(request.varbinds.len());
        for (i, vb) in request.varbinds.iter().enumerate() {
            match self.next_after(&vb.oid) {
                Some((oid, value)) => varbinds.push(VarBind::new(oid.clone(), value.clone())),
                None if version.supports_bulk() => {
                    varbinds.push(VarBind::new(vb.oid.clone(), Value::EndOfMibView))
                }
                None => return request.error_response(ErrorStatus::NoSuchName, index(i)),
            }
        }
        request.response(varbinds)
    }

    fn get_bulk(&self, request: &Pdu) -> Pdu {
        let non_repeaters = request.non_repeaters().min(request.varbinds.len());
        let (singles, repeaters) = request.varbinds.split_at(non_repeaters);

        let mut varbinds = Vec::new();
        for vb in singles {
            varbinds.push(self.next_or_end(&vb.oid));
        }

        let mut cursors: Vec<Oid> = repeaters.iter().map(|vb| vb.oid.clone()).collect();
        for _ in 0..request.max_repetitions() {
            if cursors.is_empty() {
                break;
            }
            let mut all_ended = true;
            for cursor in &mut cursors {
                let vb = self.next_or_end(cursor);
                if vb.value != Value::EndOfMibView {
                    all_ended = false;
                    *cursor = vb.oid.clone();
                }
                varbinds.push(vb);
            }
            if all_ended {
                break;
            }
        }
        request.response(varbinds)
    }

    fn next_or_end(&self, oid: &Oid) -> VarBind {
        match self.next_after(oid) {
            Some((next, value)) => VarBind::new(next.clone(), value.clone()),
            None => VarBind::new(oid.clone(), Value::EndOfMibView),
        }
    }

    /// SETs are all-or-nothing: every binding is checked before any is
    /// stored.
    fn set(&mut self, version: Version, request: &Pdu) -> Pdu {
        for (i, vb) in request.varbinds.iter().enumerate() {
            let status = if let Some(status) = self.set_errors.get(&vb.oid) {
                Some(*status)
            } else {
                match self.objects.get(&vb.oid) {
                    None if version.supports_bulk() => Some(ErrorStatus::NoCreation),
                    None => Some(ErrorStatus::NoSuchName),
                    Some(current)
                        if std::mem::discriminant(current)
                            != std::mem::discriminant(&vb.value) =>
                    {
                        if version.supports_bulk() {
                            Some(ErrorStatus::WrongType)
                        } else {
                            Some(ErrorStatus::BadValue)
                        }
                    }
                    Some(_) => None,
                }
            };
            if let Some(status) = status {
                return request.error_response(status, index(i));
            }
        }

        for vb in &request.varbinds {
            self.objects.insert(vb.oid.clone(), vb.value.clone());
        }
        request.response(request.varbinds.clone())
    }
}

/// 1-based error index for the binding at `i`.
fn index(i: usize) -> i32 {
    i32::try_from(i + 1).unwrap_or(i32::MAX)
}

impl Transport for MockAgent {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let mut inner = self.inner.lock();
        let pending = inner.handle(data);
        inner.pending.push_back(pending);
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let mut inner = self.inner.lock();
        let target = inner.target;
        match inner.pending.pop_front() {
            Some(Pending::Datagram(data)) => Ok((data, target)),
            Some(Pending::Io(msg)) => Err(Error::Io {
                target: Some(target),
                source: std::io::Error::other(msg),
            }),
            Some(Pending::Lost) | None => Err(Error::Timeout {
                target: Some(target),
                elapsed: timeout,
                request_id,
                retries: 0,
            }),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.lock().target
    }

    fn local_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn exchange(agent: &MockAgent, version: Version, pdu: Pdu) -> Pdu {
        let msg = CommunityMessage::new(version, Bytes::from_static(b"public"), pdu);
        futures::executor::block_on(async {
            agent.send(&msg.encode()).await.unwrap();
            let (data, _) = agent.recv(0, Duration::from_secs(1)).await.unwrap();
            CommunityMessage::decode(data).unwrap().into_pdu()
        })
    }

    fn sample() -> MockAgent {
        MockAgent::new()
            .with_object(oid!(1, 3, 6, 1, 9, 3, 1), "jdoe")
            .with_object(oid!(1, 3, 6, 1, 9, 3, 2), "rms")
            .with_object(oid!(1, 3, 6, 1, 9, 25, 1), Value::Integer(3))
    }

    #[test]
    fn test_get_missing_by_version() {
        let agent = sample();
        let request = Pdu::get_request(1, &[oid!(1, 3, 6, 1, 9, 3, 9)]);

        let v2 = exchange(&agent, Version::V2c, request.clone());
        assert!(!v2.is_error());
        assert_eq!(v2.varbinds[0].value, Value::NoSuchObject);

        let v1 = exchange(&agent, Version::V1, request);
        assert_eq!(v1.error_status_enum(), ErrorStatus::NoSuchName);
        assert_eq!(v1.error_index, 1);
    }

    #[test]
    fn test_get_next_walks_in_order() {
        let agent = sample();
        let response = exchange(
            &agent,
            Version::V2c,
            Pdu::get_next_request(1, &[oid!(1, 3, 6, 1, 9, 3, 1)]),
        );
        assert_eq!(response.varbinds[0].oid, oid!(1, 3, 6, 1, 9, 3, 2));

        let end = exchange(
            &agent,
            Version::V2c,
            Pdu::get_next_request(2, &[oid!(1, 3, 6, 1, 9, 25, 1)]),
        );
        assert_eq!(end.varbinds[0].value, Value::EndOfMibView);
    }

    #[test]
    fn test_get_bulk_stops_when_all_ended() {
        let agent = sample();
        let response = exchange(
            &agent,
            Version::V2c,
            Pdu::get_bulk(1, 0, 10, &[oid!(1, 3, 6, 1, 9)]),
        );
        let oids: Vec<_> = response.varbinds.iter().map(|vb| vb.oid.clone()).collect();
        assert_eq!(
            oids,
            vec![
                oid!(1, 3, 6, 1, 9, 3, 1),
                oid!(1, 3, 6, 1, 9, 3, 2),
                oid!(1, 3, 6, 1, 9, 25, 1),
                oid!(1, 3, 6, 1, 9, 25, 1),
            ]
        );
        assert_eq!(response.varbinds[3].value, Value::EndOfMibView);
    }

    #[test]
    fn test_set_type_check_and_store() {
        let agent = sample();
        let target = oid!(1, 3, 6, 1, 9, 25, 1);

        let wrong = exchange(
            &agent,
            Version::V2c,
            Pdu::set_request(1, vec![VarBind::new(target.clone(), Value::from("x"))]),
        );
        assert_eq!(wrong.error_status_enum(), ErrorStatus::WrongType);

        let ok = exchange(
            &agent,
            Version::V2c,
            Pdu::set_request(2, vec![VarBind::new(target.clone(), Value::Integer(6))]),
        );
        assert!(!ok.is_error());
        assert_eq!(agent.object(&target), Some(Value::Integer(6)));
    }

    #[test]
    fn test_scripted_timeout_and_community_filter() {
        let agent = sample().with_community(b"secret");
        agent.fail_next_with_timeout();
        let msg = CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"secret"),
            Pdu::get_request(1, &[oid!(1, 3, 6, 1, 9, 3, 1)]),
        );
        let result = futures::executor::block_on(async {
            agent.send(&msg.encode()).await.unwrap();
            agent.recv(1, Duration::from_millis(5)).await
        });
        assert!(matches!(result, Err(Error::Timeout { .. })));

        // wrong community is dropped too
        let msg = CommunityMessage::new(
            Version::V2c,
            Bytes::from_static(b"public"),
            Pdu::get_request(2, &[oid!(1, 3, 6, 1, 9, 3, 1)]),
        );
        let result = futures::executor::block_on(async {
            agent.send(&msg.encode()).await.unwrap();
            agent.recv(2, Duration::from_millis(5)).await
        });
        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert_eq!(agent.request_count(), 2);
    }
}
