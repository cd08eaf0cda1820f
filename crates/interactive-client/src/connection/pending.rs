use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::oneshot;

use interactive_core::encoding::Scheme;
use interactive_core::error::{InteractiveError, Result};

/// Caller waiting on a reply.
#[derive(Debug)]
pub(crate) struct PendingCall {
    tx: oneshot::Sender<Result<Value>>,
    /// Scheme to activate if the reply agrees to it (`setCompression` only).
    pub(crate) upgrade: Option<Scheme>,
}

impl PendingCall {
    /// Resolve the waiting caller. A caller that already gave up is ignored.
    pub(crate) fn complete(self, outcome: Result<Value>) {
        let _ = self.tx.send(outcome);
    }
}

/// Outstanding calls keyed by call id:
/// - inserted before the method envelope is sent
/// - removed by exactly one of reply, timeout, send failure or close
#[derive(Debug, Default)]
pub(crate) struct PendingCalls {
    calls: DashMap<u64, PendingCall>,
}

impl PendingCalls {
    pub(crate) fn register(&self, id: u64, upgrade: Option<Scheme>) -> oneshot::Receiver<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.calls.insert(id, PendingCall { tx, upgrade });
        rx
    }

    pub(crate) fn take(&self, id: u64) -> Option<PendingCall> {
        self.calls.remove(&id).map(|(_, call)| call)
    }

    pub(crate) fn len(&self) -> usize {
        self.calls.len()
    }

    /// Fail every outstanding call with `ConnectionClosed`.
    pub(crate) fn fail_all(&self) -> usize {
        let ids: Vec<u64> = self.calls.iter().map(|e| *e.key()).collect();
        let mut failed = 0;
        for id in ids {
            if let Some(call) = self.take(id) {
                call.complete(Err(InteractiveError::ConnectionClosed));
                failed += 1;
            }
        }
        failed
    }
}
