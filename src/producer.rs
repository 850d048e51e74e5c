//! Delayed producer.
//!
//! Turns a plain closure into a deferred result that settles once the delay
//! has elapsed. The closure runs on its own tokio task, so it executes
//! whether or not anybody ever awaits the returned [`Deferred`].
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time;
use tracing::trace;

/// Handle to a value produced by a spawned task.
///
/// Awaiting it yields the task's output. If the task panicked, the panic is
/// resumed in the awaiting task with its original payload. Dropping the
/// handle detaches the task, it keeps running.
#[derive(Debug)]
pub struct Deferred<T> {
    // `None` once the task's output has been taken; a `JoinHandle` must not
    // be polled again after it completed.
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> Deferred<T> {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Deferred {
            handle: Some(tokio::spawn(future)),
        }
    }
}

impl<T> Deferred<T> {
    /// Returns `true` once the underlying task has produced its value.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl<T> Future for Deferred<T> {
    type Output = T;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(handle) = self.handle.as_mut() else {
            return Poll::Pending;
        };
        let joined = ready!(Pin::new(handle).poll(cx));
        self.handle = None;

        match joined {
            Ok(value) => Poll::Ready(value),
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => {
                // Only happens when the runtime shuts down underneath us.
                trace!("task dropped by the runtime, result will never settle");
                Poll::Pending
            }
        }
    }
}

/// Run `computation` once, after `delay`.
///
/// `Ok(v)` settles the returned deferred result with `v`, `Err(e)` settles it
/// with `e` exactly as the computation returned it. A computation with
/// nothing to return should return `Ok(())`.
///
/// Must be called from within a tokio runtime.
///
/// ```no_run
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// # async fn doc() {
/// let entity = promise_tracking::schedule(Duration::from_millis(100), || {
///     Ok::<_, Infallible>("BIG ENTITY")
/// });
/// assert_eq!(entity.await, Ok("BIG ENTITY"));
/// # }
/// ```
pub fn schedule<T, E, C>(delay: Duration, computation: C) -> Deferred<Result<T, E>>
where
    C: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    Deferred::spawn(async move {
        time::sleep(delay).await;
        trace!(?delay, "running delayed computation");
        computation()
    })
}

/// Like [`schedule`], but hands `args` to the computation when it runs.
pub fn schedule_with<A, T, E, C>(delay: Duration, args: A, computation: C) -> Deferred<Result<T, E>>
where
    A: Send + 'static,
    C: FnOnce(A) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    schedule(delay, move || computation(args))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[derive(Debug, PartialEq)]
    struct Boom(&'static str);

    #[tokio::test(start_paused = true)]
    async fn settles_with_value_after_delay() {
        let start = Instant::now();
        let value = schedule(Duration::from_millis(100), || Ok::<_, Infallible>("X")).await;

        assert_eq!(value, Ok("X"));
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn unit_computation() {
        let value = schedule(Duration::ZERO, || Ok::<(), Infallible>(())).await;
        assert_eq!(value, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_is_carried_unchanged() {
        let value = schedule(Duration::from_secs(1), || Err::<(), _>(Boom("boom"))).await;
        assert_eq!(value, Err(Boom("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_arguments() {
        let value = schedule_with(Duration::from_millis(10), (2, 3), |(a, b)| {
            Ok::<_, Infallible>(a * b)
        })
        .await;
        assert_eq!(value, Ok(6));
    }

    #[tokio::test(start_paused = true)]
    async fn runs_exactly_once_without_being_awaited() {
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        let deferred = schedule(Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(())
        });
        drop(deferred);

        time::sleep(Duration::from_millis(40)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(100)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_finished() {
        let deferred = schedule(Duration::from_millis(5), || Ok::<_, Infallible>(1));
        assert!(!deferred.is_finished());

        time::sleep(Duration::from_millis(10)).await;
        assert!(deferred.is_finished());
        assert_eq!(deferred.await, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "computation panicked")]
    async fn panic_is_resumed_on_await() {
        let deferred = schedule(Duration::ZERO, || -> Result<(), Infallible> {
            panic!("computation panicked")
        });
        let _ = deferred.await;
    }
}
