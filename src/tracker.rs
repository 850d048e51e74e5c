//! Status tracking for a single deferred result.
//!
//! A [`Tracker`] wraps a future that settles with `Result<T, E>`. Before the
//! chain is terminated, any number of probes can be attached with
//! [`Tracker::probe`]; each one fires after its offset, but only while the
//! result is still pending, and may cancel delivery of the outcome. The
//! chain is terminated with [`Tracker::resolve`] (or one of its variants),
//! which starts driving the wrapped future and returns a [`Settled`] handle
//! to the outcome of the registered handlers.
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use tracing::{debug, debug_span, trace, Instrument};

use crate::error::Cancelled;
use crate::producer::Deferred;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::status::{Status, StatusCell};

/// Tracks one deferred result.
///
/// Created with [`Tracker::new`], extended with probes, and consumed by the
/// terminal call. All chain-building calls return immediately; effects are
/// deferred to timers and to the driving task.
pub struct Tracker<F, S = TokioScheduler> {
    /// The deferred result being tracked. Nothing polls it until the chain
    /// is terminated.
    future: F,

    /// Shared with every probe and with the driving task.
    status: StatusCell,

    /// Timer primitive used to fire probes.
    scheduler: S,
}

/// Capability handed to probe callbacks.
///
/// Cancelling suppresses delivery of the tracked outcome to the handlers
/// registered by the terminal call. It does not stop the producer, and it
/// does not abort probe timers that are already scheduled; those find the
/// tracker no longer pending and skip their callback.
#[derive(Debug, Clone)]
pub struct Cancel {
    status: StatusCell,
}

impl Cancel {
    /// Cancel the tracker.
    ///
    /// Returns `true` if this call cancelled it. If the tracker already left
    /// the pending state (settled first, or cancelled earlier) nothing
    /// changes and `false` is returned.
    pub fn cancel(&self) -> bool {
        self.status.transition(Status::Cancelled)
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == Status::Cancelled
    }
}

impl<F> Tracker<F> {
    /// Track `future`, firing probes on the tokio timer.
    ///
    /// Probes are spawned as tokio tasks, so probing must happen from within
    /// a tokio runtime.
    pub fn new(future: F) -> Self {
        Tracker::with_scheduler(future, TokioScheduler)
    }
}

impl<F, S> Tracker<F, S> {
    pub fn with_scheduler(future: F, scheduler: S) -> Self {
        Tracker {
            future,
            status: StatusCell::new(),
            scheduler,
        }
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }
}

impl<F, S: Scheduler> Tracker<F, S> {
    /// Run `callback` after `offset` if the result is still pending then.
    ///
    /// `offset` counts from this call, not from the creation of the tracker
    /// or the start of the producer. The callback receives a [`Cancel`]
    /// capability. If the tracker has already settled or been cancelled when
    /// the timer fires, the callback is skipped entirely.
    ///
    /// A panicking callback is not caught here. It never changes the
    /// status, which was checked before the callback ran.
    pub fn probe<C>(self, offset: Duration, callback: C) -> Self
    where
        C: FnOnce(&Cancel) + Send + 'static,
    {
        let cancel = Cancel {
            status: self.status.clone(),
        };

        debug!(?offset, "probe scheduled");
        let _ = self.scheduler.schedule_after(offset, move || {
            let status = cancel.status();
            if status.is_pending() {
                callback(&cancel);
            } else {
                trace!(?offset, %status, "probe skipped");
            }
        });

        self
    }
}

impl<F, S, T, E> Tracker<F, S>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Register the success and failure handlers and start driving the
    /// tracked result.
    ///
    /// When the result settles while the tracker is still pending, the status
    /// moves to `Fulfilled` or `Rejected` and the matching handler runs; what
    /// it returns becomes the outcome of the returned [`Settled`]. If a probe
    /// cancelled first, neither handler runs and the `Settled` never
    /// completes (see [`Settled::or_cancelled`]).
    pub fn resolve<U, E2, OnOk, OnErr>(
        self,
        on_success: OnOk,
        on_failure: OnErr,
    ) -> Settled<Result<U, E2>>
    where
        OnOk: FnOnce(T) -> Result<U, E2> + Send + 'static,
        OnErr: FnOnce(E) -> Result<U, E2> + Send + 'static,
        U: Send + 'static,
        E2: Send + 'static,
    {
        self.drive(move |status, outcome| match outcome {
            Ok(value) => status
                .transition(Status::Fulfilled)
                .then(|| on_success(value)),
            Err(err) => status
                .transition(Status::Rejected)
                .then(|| on_failure(err)),
        })
    }

    /// [`resolve`](Tracker::resolve) with the failure passed through
    /// unchanged.
    pub fn resolve_ok<U, OnOk>(self, on_success: OnOk) -> Settled<Result<U, E>>
    where
        OnOk: FnOnce(T) -> Result<U, E> + Send + 'static,
        U: Send + 'static,
    {
        self.resolve(on_success, Err)
    }

    /// [`resolve`](Tracker::resolve) with both outcomes passed through
    /// unchanged.
    ///
    /// Unless cancelled, the returned `Settled` yields exactly what the
    /// tracked result produced.
    pub fn passthrough(self) -> Settled<Result<T, E>> {
        self.resolve(Ok, Err)
    }

    /// Register only a failure handler.
    ///
    /// Failures are gated like in [`resolve`](Tracker::resolve). A success
    /// is not observed by the tracker at all: the value goes straight
    /// through to the returned `Settled` and the status stays `Pending`.
    /// This holds even after a probe cancelled the tracker.
    pub fn fail<E2, OnErr>(self, on_failure: OnErr) -> Settled<Result<T, E2>>
    where
        OnErr: FnOnce(E) -> Result<T, E2> + Send + 'static,
        E2: Send + 'static,
    {
        self.drive(move |status, outcome| match outcome {
            Ok(value) => Some(Ok(value)),
            Err(err) => status
                .transition(Status::Rejected)
                .then(|| on_failure(err)),
        })
    }

    /// Spawn the task that awaits the tracked result and hands its outcome
    /// to `deliver`. `None` from `deliver` means the outcome was suppressed.
    fn drive<O, D>(self, deliver: D) -> Settled<O>
    where
        D: FnOnce(&StatusCell, Result<T, E>) -> Option<O> + Send + 'static,
        O: Send + 'static,
    {
        let Tracker { future, status, .. } = self;

        let cell = status.clone();
        let task = async move {
            let outcome = future.await;
            let delivered = deliver(&cell, outcome);
            if delivered.is_none() {
                trace!(status = %cell.get(), "outcome suppressed");
            }
            delivered
        };

        Settled {
            inner: Deferred::spawn(task.instrument(debug_span!("tracked_result"))),
            status,
        }
    }
}

impl<F, S> fmt::Debug for Tracker<F, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("status", &self.status.get())
            .finish_non_exhaustive()
    }
}

/// Outcome of the handlers registered by a terminal call.
///
/// Awaiting it yields the handler's result. When a probe cancelled the
/// tracker before the tracked result settled, no handler runs and awaiting
/// never completes; use [`or_cancelled`](Settled::or_cancelled) to observe
/// the cancellation instead.
#[derive(Debug)]
pub struct Settled<T> {
    inner: Deferred<Option<T>>,
    status: StatusCell,
}

impl<T> Settled<T> {
    /// Status of the tracker this outcome belongs to.
    pub fn status(&self) -> Status {
        self.status.get()
    }

    /// Resolve to `Err(Cancelled)` as soon as the tracker is cancelled,
    /// rather than waiting forever.
    pub async fn or_cancelled(mut self) -> Result<T, Cancelled> {
        let mut status = self.status.subscribe();
        let cancelled = async move {
            if status.wait_for(|s| *s == Status::Cancelled).await.is_err() {
                // `self` keeps a sender alive, so this cannot happen while
                // we are still selecting.
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            outcome = &mut self => Ok(outcome),
            () = cancelled => Err(Cancelled),
        }
    }
}

impl<T> Future for Settled<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match ready!(Pin::new(&mut self.inner).poll(cx)) {
            Some(outcome) => Poll::Ready(outcome),
            // Delivery suppressed; the inner handle is spent and will stay
            // pending from now on.
            None => Poll::Pending,
        }
    }
}
