//! Registry of synchronous calls awaiting their replies.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::oneshot;

use crate::{error::RpcError, nonce::Nonce};

/// How a pending call was completed.
#[derive(Debug)]
pub(crate) enum PendingOutcome {
    /// The peer replied; the payload still needs validating.
    Reply(Bytes),
    /// The peer answered with an `ERROR` event.
    Failed { code: i64, message: String },
    /// The answer could not be decoded.
    Malformed(String),
    /// The connection ended first.
    Disconnected,
}

#[derive(Default)]
struct Inner {
    calls: DashMap<Nonce, oneshot::Sender<PendingOutcome>>,
    closed: AtomicBool,
}

/// Concurrent map from nonce to single-use completion slot.
///
/// Resolution and cancellation both remove the entry, so whichever happens
/// first wins and the other becomes a no-op.
#[derive(Clone, Default)]
pub(crate) struct PendingCalls {
    inner: Arc<Inner>,
}

impl PendingCalls {
    /// Register a waiter for `nonce`.
    ///
    /// Fails with [`RpcError::SocketDisconnected`] once [`fail_all`] has run,
    /// so no caller can wait on a connection that already ended.
    ///
    /// [`fail_all`]: Self::fail_all
    pub(crate) fn register(&self, nonce: Nonce) -> Result<oneshot::Receiver<PendingOutcome>, RpcError> {
        let (tx, rx) = oneshot::channel();
        self.inner.calls.insert(nonce.clone(), tx);
        if self.inner.closed.load(Ordering::SeqCst) {
            self.inner.calls.remove(&nonce);
            return Err(RpcError::SocketDisconnected);
        }
        Ok(rx)
    }

    /// Complete the waiter for `nonce`. Returns `false` if none was
    /// registered.
    pub(crate) fn resolve(&self, nonce: &Nonce, outcome: PendingOutcome) -> bool {
        match self.inner.calls.remove(nonce) {
            Some((_, tx)) => {
                // The caller may have given up in the meantime.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Drop the waiter for `nonce` without completing it.
    pub(crate) fn cancel(&self, nonce: &Nonce) -> bool { self.inner.calls.remove(nonce).is_some() }

    /// Fail every waiter with [`PendingOutcome::Disconnected`] and refuse new
    /// registrations.
    pub(crate) fn fail_all(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let nonces: Vec<Nonce> = self
            .inner
            .calls
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for nonce in nonces {
            self.resolve(&nonce, PendingOutcome::Disconnected);
        }
    }

    /// Number of calls still waiting.
    pub(crate) fn len(&self) -> usize { self.inner.calls.len() }
}
