//! Periodic tick scheduling
//!
//! Drives [`HealthEngine::run_tick`] from a tokio interval. The engine is shared behind a
//! single async mutex, so scheduled ticks and manual edits made through the same handle are
//! serialised: a tick runs to completion under the lock and contains no await point.
//!
//! Cancelling the scheduler stops future ticks; a tick already holding the lock finishes
//! first. Dropping the [`SchedulerHandle`] also stops the task.

use chrono::{Local, NaiveDate};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, debug_span, info, warn};

use crate::athlete::Athlete;
use crate::engine::HealthEngine;

/// Tick period used when none is configured
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(15);

const REPORT_CHANNEL_CAPACITY: usize = 64;

/// Engine shared between the scheduler and other callers
pub type SharedEngine<R> = Arc<Mutex<HealthEngine<R>>>;

pub fn shared<R>(engine: HealthEngine<R>) -> SharedEngine<R> {
    Arc::new(Mutex::new(engine))
}

/// Result of one scheduled tick
#[derive(Debug, Clone)]
pub struct TickReport {
    /// 1-based tick counter since the scheduler started
    pub tick: u64,
    pub date: NaiveDate,
    /// Athletes recomputed during this tick; empty when simulation is disabled
    pub changed: Vec<Arc<Athlete>>,
}

/// Spawns the periodic tick task
pub struct TickScheduler;

impl TickScheduler {
    /// Start ticking `engine` every `period`. The first tick fires one period after start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(engine: SharedEngine<R>, period: Duration) -> SchedulerHandle
    where
        R: Rng + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let task_reports = reports.clone();

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut tick: u64 = 0;

            info!(period_ms = period.as_millis() as u64, "Tick scheduler started");

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => {
                        debug!("Tick scheduler received shutdown signal");
                        break;
                    }
                    _ = interval.tick() => {
                        tick += 1;
                        let date = Local::now().date_naive();
                        let changed = {
                            let mut engine = engine.lock().await;
                            debug_span!("tick", tick, %date).in_scope(|| engine.run_tick(date))
                        };

                        debug!(tick, changed = changed.len(), "Scheduled tick complete");
                        // No subscribers is not an error
                        let _ = task_reports.send(TickReport { tick, date, changed });
                    }
                }
            }

            info!(ticks = tick, "Tick scheduler stopped");
        });

        SchedulerHandle {
            shutdown_tx,
            reports,
            task,
        }
    }
}

/// Control handle for a running scheduler
pub struct SchedulerHandle {
    shutdown_tx: mpsc::Sender<()>,
    reports: broadcast::Sender<TickReport>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Receive a [`TickReport`] for every tick from now on
    pub fn subscribe(&self) -> broadcast::Receiver<TickReport> {
        self.reports.subscribe()
    }

    /// Request the scheduler to stop without waiting for it
    pub fn cancel(&self) {
        // A full channel means a shutdown is already pending
        let _ = self.shutdown_tx.try_send(());
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Cancel and wait for the task to exit
    pub async fn shutdown(self) {
        let SchedulerHandle {
            shutdown_tx, task, ..
        } = self;
        let _ = shutdown_tx.try_send(());

        if let Err(e) = task.await {
            warn!("Tick scheduler task ended abnormally: {e}");
        }
    }
}
