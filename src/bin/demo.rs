use std::time::Duration;

use anyhow::anyhow;
use clap::Parser;
use promise_tracking::{schedule, Deferred, Tracker};
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Track four tasks of different lengths the way a UI would: show a loader
/// right away, switch to a progress bar when the task is slow, give up when
/// the server looks busy.
#[derive(Debug, Parser)]
struct Opts {
    /// How long the short task takes.
    #[arg(long, default_value = "100ms", value_parser = humantime::parse_duration)]
    short: Duration,

    /// How long the long task takes.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    long: Duration,

    /// How long the very long task takes.
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    very_long: Duration,

    /// When the failing task fails.
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    fail_after: Duration,

    /// When to replace the loader with a progress bar.
    #[arg(long, default_value = "500ms", value_parser = humantime::parse_duration)]
    show_progress: Duration,

    /// When to cancel a task that is still running.
    #[arg(long, default_value = "2s", value_parser = humantime::parse_duration)]
    give_up: Duration,
}

type Task = Deferred<anyhow::Result<&'static str>>;

async fn track(name: &'static str, task: Task, opts: &Opts) {
    let start = Instant::now();

    let settled = Tracker::new(task)
        .probe(Duration::ZERO, move |_| {
            info!(task = name, "started, send request, show loader");
        })
        .probe(opts.show_progress, move |_| {
            info!(task = name, elapsed = ?start.elapsed(), "this may take a while, show progress bar");
        })
        .probe(opts.give_up, move |cancel| {
            info!(task = name, elapsed = ?start.elapsed(), "server is busy, ask the user to try again later");
            cancel.cancel();
        })
        .resolve(
            move |entity| {
                info!(task = name, elapsed = ?start.elapsed(), "created {entity} successfully");
                Ok(())
            },
            move |err: anyhow::Error| {
                warn!(task = name, elapsed = ?start.elapsed(), "error: {err}");
                Ok::<_, anyhow::Error>(())
            },
        );

    if settled.or_cancelled().await.is_err() {
        info!(task = name, elapsed = ?start.elapsed(), "cancelled, result discarded");
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    let entity = || Ok("BIG ENTITY");

    track("short", schedule(opts.short, entity), &opts).await;
    track("long", schedule(opts.long, entity), &opts).await;
    track("very long", schedule(opts.very_long, entity), &opts).await;
    track(
        "failing",
        schedule(opts.fail_after, || Err(anyhow!("something went wrong"))),
        &opts,
    )
    .await;
}
