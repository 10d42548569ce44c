//! Cancellable periodic task runner.
//!
//! A [`SimpleWatchdog`] ticks until its [`CancellationToken`] fires. Work
//! errors go to the error hook and never end the loop. The stop hook runs
//! once, after the last tick has finished.


use std::fmt;
use std::time::Duration;

use futures::future::BoxFuture;
use prometheus::Histogram;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::Error;
use crate::Result;

type TickFn = Box<dyn FnMut() -> BoxFuture<'static, Result<()>> + Send>;
type ErrorFn = Box<dyn FnMut(Error) + Send>;
type StopFn = Box<dyn FnOnce() + Send>;

pub struct SimpleWatchdog {
    interval: Duration,
    on_tick: TickFn,
    on_error: ErrorFn,
    on_stop: Option<StopFn>,
    latency: Option<Histogram>,
    wait_for: Option<JoinHandle<()>>,
}

impl fmt::Debug for SimpleWatchdog {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("SimpleWatchdog")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl SimpleWatchdog {
    /// Watchdog running `on_tick` right away and then every `interval`.
    pub fn new<F>(
        interval: Duration,
        on_tick: F,
    ) -> Self
    where
        F: FnMut() -> BoxFuture<'static, Result<()>> + Send + 'static,
    {
        Self {
            interval,
            on_tick: Box::new(on_tick),
            on_error: Box::new(|_| {}),
            on_stop: None,
            latency: None,
            wait_for: None,
        }
    }

    pub fn on_error<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: FnMut(Error) + Send + 'static,
    {
        self.on_error = Box::new(f);
        self
    }

    pub fn on_stop<F>(
        mut self,
        f: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_stop = Some(Box::new(f));
        self
    }

    /// Records each tick's duration in seconds.
    pub fn with_latency(
        mut self,
        histogram: Histogram,
    ) -> Self {
        self.latency = Some(histogram);
        self
    }

    /// Delays the first tick until `previous` has finished.
    pub fn after(
        mut self,
        previous: Option<JoinHandle<()>>,
    ) -> Self {
        self.wait_for = previous;
        self
    }

    pub fn spawn(
        self,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(token))
    }

    pub async fn run(
        mut self,
        token: CancellationToken,
    ) {
        if let Some(previous) = self.wait_for.take() {
            // a panicked predecessor has nothing left to clean up
            let _ = previous.await;
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let started = Instant::now();
            if let Err(e) = (self.on_tick)().await {
                (self.on_error)(e);
            }
            if let Some(latency) = &self.latency {
                latency.observe(started.elapsed().as_secs_f64());
            }
        }

        trace!("watchdog stopping");
        if let Some(on_stop) = self.on_stop.take() {
            on_stop();
        }
    }
}
