use std::future::Future;
use std::time::Duration;

use crate::tracker::{Cancel, Tracker};

/// Adds tracking to every future that settles with a `Result`.
///
/// Bring the trait into scope to opt in:
///
/// ```no_run
/// use std::convert::Infallible;
/// use std::time::Duration;
/// use promise_tracking::TrackExt;
///
/// # async fn doc() {
/// let outcome = async { Ok::<_, Infallible>(42) }
///     .probe(Duration::from_millis(500), |_| println!("still waiting"))
///     .passthrough()
///     .await;
/// # }
/// ```
pub trait TrackExt: Future + Sized {
    /// Wrap this future in a [`Tracker`] without attaching any probe.
    fn track(self) -> Tracker<Self> {
        Tracker::new(self)
    }

    /// Shorthand for `self.track().probe(offset, callback)`.
    fn probe<C>(self, offset: Duration, callback: C) -> Tracker<Self>
    where
        C: FnOnce(&Cancel) + Send + 'static,
    {
        self.track().probe(offset, callback)
    }
}

impl<F, T, E> TrackExt for F where F: Future<Output = Result<T, E>> + Send + 'static {}
