use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

/// Lifecycle of a tracked deferred result.
///
/// A tracker starts out `Pending` and moves to exactly one of the other
/// variants. Once it has left `Pending` it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Not settled yet, and no probe has cancelled it.
    Pending,
    /// Settled successfully while still pending.
    Fulfilled,
    /// Settled with a failure while still pending.
    Rejected,
    /// A probe invoked its cancellation capability first.
    Cancelled,
}

impl Status {
    /// `true` until the tracker settles or is cancelled.
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    /// `true` for every variant a tracker cannot leave.
    pub fn is_terminal(self) -> bool {
        !self.is_pending()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Pending => "pending",
            Status::Fulfilled => "fulfilled",
            Status::Rejected => "rejected",
            Status::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Shared status of one tracker.
///
/// Every probe timer, the driving task and each `Cancel` handle hold a clone.
/// The value lives in a `watch` channel so that a transition is a single
/// compare-and-set under the channel lock, and so that waiters can be told
/// when the terminal state is reached.
#[derive(Debug, Clone)]
pub(crate) struct StatusCell {
    tx: Arc<watch::Sender<Status>>,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        let (tx, _) = watch::channel(Status::Pending);
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn get(&self) -> Status {
        *self.tx.borrow()
    }

    /// Move from `Pending` to `to`.
    ///
    /// Returns `true` if this call performed the transition. Any call made
    /// after the first successful one leaves the status untouched and
    /// returns `false`.
    pub(crate) fn transition(&self, to: Status) -> bool {
        debug_assert!(to.is_terminal(), "cannot transition back to pending");

        let won = self.tx.send_if_modified(|status| {
            if status.is_pending() {
                *status = to;
                true
            } else {
                false
            }
        });

        if won {
            debug!(status = %to, "tracker settled");
        }
        won
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Status> {
        self.tx.subscribe()
    }
}
