//! Time-based probes and cancellation for a single deferred result.
//!
//! A deferred result is any future settling with `Result<T, E>`, typically
//! one created with [`schedule`]. Wrapping it in a [`Tracker`] lets callers
//! attach probes that fire at fixed offsets while the result is still
//! pending (to show a loader, then a progress bar, ...) and that may cancel
//! delivery altogether. The chain ends with a terminal call such as
//! [`Tracker::resolve`], which delivers the outcome to its handlers at most
//! once, and never after a probe cancelled.
//!
//! ```no_run
//! use std::time::Duration;
//! use promise_tracking::{schedule, Tracker};
//!
//! # async fn doc() {
//! let task = schedule(Duration::from_secs(5), || Ok::<_, String>("BIG ENTITY"));
//!
//! let settled = Tracker::new(task)
//!     .probe(Duration::ZERO, |_| println!("show loader"))
//!     .probe(Duration::from_millis(500), |_| println!("show progress bar"))
//!     .probe(Duration::from_secs(2), |cancel| {
//!         println!("server is busy, try again later");
//!         cancel.cancel();
//!     })
//!     .resolve(
//!         |entity| Ok(format!("created {entity}")),
//!         |err| Err(format!("error: {err}")),
//!     );
//!
//! assert!(settled.or_cancelled().await.is_err());
//! # }
//! ```
//!
//! All timers run on tokio; the crate must be used from within a tokio
//! runtime.

mod error;
pub use error::Cancelled;

mod ext;
pub use ext::TrackExt;

pub mod producer;
pub use producer::{schedule, schedule_with, Deferred};

pub mod scheduler;
pub use scheduler::{Scheduler, TokioScheduler};

mod status;
pub use status::Status;

mod tracker;
pub use tracker::{Cancel, Settled, Tracker};
