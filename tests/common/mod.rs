#![allow(dead_code)]

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use promise_tracking::Scheduler;
use tokio::sync::oneshot;

static INIT_LOGGING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
pub fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

pub fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Shared invocation counter.
#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Ordered log of events, for asserting relative ordering.
#[derive(Debug, Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

impl Events {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

type Callback = Box<dyn FnOnce() + Send>;

/// Scheduler whose timers only fire when the test says so.
///
/// The requested delay is recorded but otherwise ignored, which lets a test
/// replay any interleaving of probe timers and settlement.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    timers: Arc<Mutex<Vec<(Duration, Option<Callback>)>>>,
}

impl ManualScheduler {
    pub fn len(&self) -> usize {
        self.timers.lock().unwrap().len()
    }

    pub fn delay(&self, index: usize) -> Duration {
        self.timers.lock().unwrap()[index].0
    }

    /// Fire timer `index`. Panics if it already fired.
    pub fn fire(&self, index: usize) {
        let callback = self.timers.lock().unwrap()[index]
            .1
            .take()
            .expect("timer already fired");
        callback();
    }
}

impl Scheduler for ManualScheduler {
    type Handle = usize;

    fn schedule_after<C>(&self, delay: Duration, callback: C) -> usize
    where
        C: FnOnce() + Send + 'static,
    {
        let mut timers = self.timers.lock().unwrap();
        timers.push((delay, Some(Box::new(callback))));
        timers.len() - 1
    }
}

/// A deferred result settled by hand through the returned sender.
pub fn deferred<T, E>() -> (
    oneshot::Sender<Result<T, E>>,
    impl Future<Output = Result<T, E>> + Send + 'static,
)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let future = async move {
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => std::future::pending().await,
        }
    };
    (tx, future)
}
