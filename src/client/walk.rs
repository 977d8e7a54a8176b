//! Walk stream implementations.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::value::Value;
use crate::varbind::VarBind;

use super::Client;

type PendingRequest<R> = Pin<Box<dyn Future<Output = Result<R>> + Send>>;

/// What a walk does with a binding the agent returned.
enum Step {
    Yield(VarBind),
    End,
    Fail(Error),
}

/// Subtree and ordering checks shared by both walk kinds.
struct Cursor {
    base_oid: Oid,
    current_oid: Oid,
    /// Last OID returned to the caller, to catch agents that loop.
    last_returned_oid: Option<Oid>,
    done: bool,
}

impl Cursor {
    fn new(oid: Oid) -> Self {
        Self {
            base_oid: oid.clone(),
            current_oid: oid,
            last_returned_oid: None,
            done: false,
        }
    }

    fn step(&mut self, vb: VarBind) -> Step {
        if matches!(vb.value, Value::EndOfMibView) || !vb.oid.starts_with(&self.base_oid) {
            self.done = true;
            return Step::End;
        }

        if let Some(last_oid) = self.last_returned_oid.take()
            && vb.oid <= last_oid
        {
            self.done = true;
            return Step::Fail(Error::NonIncreasingOid {
                previous: last_oid,
                current: vb.oid,
            });
        }

        self.current_oid = vb.oid.clone();
        self.last_returned_oid = Some(vb.oid.clone());
        Step::Yield(vb)
    }

    /// Map a failed request to the stream's next item.
    ///
    /// SNMPv1 agents signal the end of the MIB with noSuchName.
    fn fail(&mut self, err: Error) -> Option<Result<VarBind>> {
        self.done = true;
        match err {
            Error::Snmp {
                status: ErrorStatus::NoSuchName,
                ..
            } => None,
            err => Some(Err(err)),
        }
    }
}

impl From<Step> for Option<Result<VarBind>> {
    fn from(step: Step) -> Self {
        match step {
            Step::Yield(vb) => Some(Ok(vb)),
            Step::End => None,
            Step::Fail(err) => Some(Err(err)),
        }
    }
}

/// Async stream for walking an OID subtree using GETNEXT.
///
/// Created by [`Client::walk()`].
pub struct Walk<T: Transport> {
    client: Client<T>,
    cursor: Cursor,
    pending: Option<PendingRequest<VarBind>>,
}

impl<T: Transport> Walk<T> {
    pub(crate) fn new(client: Client<T>, oid: Oid) -> Self {
        Self {
            client,
            cursor: Cursor::new(oid),
            pending: None,
        }
    }
}

impl<T: Transport + 'static> Stream for Walk<T> {
    type Item = Result<VarBind>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.cursor.done {
            return Poll::Ready(None);
        }

        let pending = this.pending.get_or_insert_with(|| {
            let client = this.client.clone();
            let oid = this.cursor.current_oid.clone();
            Box::pin(async move { client.get_next(&oid).await })
        });

        let result = ready!(pending.as_mut().poll(cx));
        this.pending = None;

        Poll::Ready(match result {
            Ok(vb) => this.cursor.step(vb).into(),
            Err(e) => this.cursor.fail(e),
        })
    }
}

/// Async stream for walking an OID subtree using GETBULK.
///
/// Created by [`Client::bulk_walk()`].
pub struct BulkWalk<T: Transport> {
    client: Client<T>,
    cursor: Cursor,
    max_repetitions: i32,
    /// Bindings from the last GETBULK response not yet yielded.
    buffer: VecDeque<VarBind>,
    pending: Option<PendingRequest<Vec<VarBind>>>,
}

impl<T: Transport> BulkWalk<T> {
    pub(crate) fn new(client: Client<T>, oid: Oid, max_repetitions: i32) -> Self {
        // an empty response ends the walk, so never ask for zero rows
        Self {
            client,
            cursor: Cursor::new(oid),
            max_repetitions: max_repetitions.max(1),
            buffer: VecDeque::new(),
            pending: None,
        }
    }
}

impl<T: Transport + 'static> Stream for BulkWalk<T> {
    type Item = Result<VarBind>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.cursor.done {
                return Poll::Ready(None);
            }

            if let Some(vb) = this.buffer.pop_front() {
                return Poll::Ready(this.cursor.step(vb).into());
            }

            let pending = this.pending.get_or_insert_with(|| {
                let client = this.client.clone();
                let oid = this.cursor.current_oid.clone();
                let max_rep = this.max_repetitions;
                Box::pin(async move { client.get_bulk(&[oid], 0, max_rep).await })
            });

            let result = ready!(pending.as_mut().poll(cx));
            this.pending = None;

            match result {
                Ok(varbinds) if varbinds.is_empty() => {
                    this.cursor.done = true;
                    return Poll::Ready(None);
                }
                Ok(varbinds) => this.buffer = varbinds.into(),
                Err(e) => return Poll::Ready(this.cursor.fail(e)),
            }
        }
    }
}
