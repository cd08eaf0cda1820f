//! Inbound queue of server-initiated methods.
//!
//! Pull consumers poll with `pop`; push consumers park in `wait` until a
//! method arrives or the connection closes. Every waiter parked at the time
//! of a push wakes together and re-checks the queue.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

use interactive_core::protocol::Method;

#[derive(Debug, Default)]
pub(crate) struct Inbox {
    queue: Mutex<VecDeque<Method>>,
    arrivals: Notify,
    closed: AtomicBool,
}

impl Inbox {
    fn queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Method>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn push(&self, method: Method) {
        self.queue().push_back(method);
        self.arrivals.notify_waiters();
    }

    pub(crate) fn pop(&self) -> Option<Method> {
        self.queue().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.queue().len()
    }

    /// Stop parking waiters. Queued methods stay readable.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.arrivals.notify_waiters();
    }

    /// `true` once a method is queued, `false` once closed and drained.
    pub(crate) async fn wait(&self) -> bool {
        loop {
            let notified = self.arrivals.notified();
            tokio::pin!(notified);
            // Register before checking so a push in between is not missed.
            notified.as_mut().enable();

            if !self.queue().is_empty() {
                return true;
            }
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            notified.await;
        }
    }
}
