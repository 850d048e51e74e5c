//! Timer primitive used to fire probes.
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs a callback once after a delay.
///
/// Handles are fire-and-forget: trackers never cancel a timer they
/// scheduled, a stale timer simply finds the status no longer pending.
pub trait Scheduler: Clone + Send + Sync + 'static {
    type Handle;

    fn schedule_after<C>(&self, delay: Duration, callback: C) -> Self::Handle
    where
        C: FnOnce() + Send + 'static;
}

/// Schedules callbacks as tokio tasks.
///
/// Must be used from within a tokio runtime. A panicking callback only
/// takes down its own timer task; the panic is reported through the
/// returned `JoinHandle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    type Handle = JoinHandle<()>;

    fn schedule_after<C>(&self, delay: Duration, callback: C) -> Self::Handle
    where
        C: FnOnce() + Send + 'static,
    {
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        })
    }
}
