//! Live feed forwarding.
//!
//! Each subscription is a task that copies values from a capture-service
//! broadcast into the controller's tick queue, tagged with the generation it
//! was created under. Dropping the subscription aborts the task; ticks that
//! were already queued are discarded by the controller's generation check.

use std::time::Duration;

use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

/// A value delivered to the controller from a live producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum FeedTick {
    Amplitude { generation: u64, level: f64 },
    Duration { generation: u64, elapsed: Duration },
    Poll { generation: u64 },
}

impl FeedTick {
    pub(crate) fn generation(&self) -> u64 {
        match self {
            FeedTick::Amplitude { generation, .. }
            | FeedTick::Duration { generation, .. }
            | FeedTick::Poll { generation } => *generation,
        }
    }
}

/// Handle to one forwarding task. Dropping it stops delivery.
pub(crate) struct FeedSubscription {
    name: &'static str,
    task: JoinHandle<()>,
}

impl FeedSubscription {
    /// Forward every value of `rx` as a tick built by `wrap`.
    pub(crate) fn forward<T>(
        name: &'static str,
        mut rx: broadcast::Receiver<T>,
        tick_tx: mpsc::Sender<FeedTick>,
        generation: u64,
        wrap: fn(u64, T) -> FeedTick,
    ) -> Self
    where
        T: Clone + Send + 'static,
    {
        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(value) => {
                        if tick_tx.send(wrap(generation, value)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!(feed = name, skipped, "Feed lagged, skipping stale values");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!(feed = name, "Feed closed by capture service");
                        break;
                    }
                }
            }
        });

        trace!(feed = name, generation, "Feed subscribed");
        Self { name, task }
    }

    /// Emit a poll tick every `period`, first one after one full period.
    pub(crate) fn poll(period: Duration, tick_tx: mpsc::Sender<FeedTick>, generation: u64) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if tick_tx.send(FeedTick::Poll { generation }).await.is_err() {
                    break;
                }
            }
        });

        trace!(feed = "duration_poll", generation, "Poll timer started");
        Self {
            name: "duration_poll",
            task,
        }
    }
}

impl Drop for FeedSubscription {
    fn drop(&mut self) {
        self.task.abort();
        trace!(feed = self.name, "Feed unsubscribed");
    }
}

/// Running wall time accumulated across pause/resume, for poll mode.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollClock {
    base: Duration,
    since: Instant,
}

impl PollClock {
    pub(crate) fn start(base: Duration) -> Self {
        Self {
            base,
            since: Instant::now(),
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.base + self.since.elapsed()
    }
}

/// The amplitude and duration producers of one running period.
///
/// Both are released together when this is dropped.
pub(crate) struct FeedPair {
    subscriptions: [FeedSubscription; 2],
    clock: Option<PollClock>,
}

impl FeedPair {
    pub(crate) fn new(
        amplitude: FeedSubscription,
        duration: FeedSubscription,
        clock: Option<PollClock>,
    ) -> Self {
        Self {
            subscriptions: [amplitude, duration],
            clock,
        }
    }

    pub(crate) fn clock(&self) -> Option<&PollClock> {
        self.clock.as_ref()
    }

    /// Abort both producers, returning the poll clock reading if polling.
    pub(crate) fn release(self) -> Option<Duration> {
        let elapsed = self.clock.map(|clock| clock.elapsed());
        let [first, second] = &self.subscriptions;
        debug!(feeds = ?[first.name, second.name], "Feeds released");
        elapsed
    }
}
