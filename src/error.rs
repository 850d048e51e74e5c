use thiserror::Error;

/// The tracked result was cancelled by a probe, so its outcome will never be
/// delivered.
///
/// Only produced by [`Settled::or_cancelled`](crate::Settled::or_cancelled).
/// Awaiting a `Settled` directly keeps the silent behaviour and never
/// completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tracked result was cancelled before it settled")]
pub struct Cancelled;
