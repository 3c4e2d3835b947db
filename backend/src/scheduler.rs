//! Background task that periodically auto-stops sessions past their scheduled end.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::services::schedule::{ScheduleService, SweepReport};

pub struct AutoStopScheduler {
    service: ScheduleService,
    interval: Duration,
    tick_timeout: Duration,
}

/// Handle returned by [`AutoStopScheduler::start`]. Dropping it without
/// calling [`stop`](AutoStopHandle::stop) also ends the loop.
pub struct AutoStopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl AutoStopHandle {
    /// Signals the loop and waits for it to exit. A tick already in progress
    /// runs to completion first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "Auto-stop scheduler task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl AutoStopScheduler {
    pub fn new(service: ScheduleService, interval: Duration, tick_timeout: Duration) -> Self {
        Self {
            service,
            interval,
            tick_timeout,
        }
    }

    /// Spawns the tick loop and returns immediately. The first tick fires one
    /// interval after the call.
    pub fn start(self) -> AutoStopHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(self.run(receiver));
        AutoStopHandle { shutdown, task }
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            tick_timeout_secs = self.tick_timeout.as_secs(),
            "Auto-stop scheduler started"
        );

        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!("Auto-stop scheduler stopped");
    }

    /// Runs one sweep bounded by the tick timeout. Returns `None` when the
    /// sweep failed or was abandoned; the next tick retries naturally.
    pub async fn tick(&self) -> Option<SweepReport> {
        let now = self.service.clock().now();
        let sweep = self.service.process_scheduled_sessions(now);

        match time::timeout(self.tick_timeout, sweep).await {
            Ok(Ok(report)) => {
                if report.completed > 0 {
                    tracing::info!(
                        completed = report.completed,
                        failed = report.failed(),
                        "Auto-stopped scheduled sessions"
                    );
                }
                Some(report)
            }
            Ok(Err(err)) => {
                tracing::error!(error = %err, "Failed to scan for scheduled sessions");
                None
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.tick_timeout.as_secs(),
                    "Auto-stop tick timed out"
                );
                None
            }
        }
    }
}
