//! Fixed-rate tick driver.
//!
//! A single tokio task ticks the registry once per period. Ticks run inline
//! on that task, so tick N+1 can never start before tick N has returned; if a
//! tick overruns its period the missed deadlines are skipped rather than
//! queued.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

use crate::error::{Result, RuntimeError};
use crate::registry::HunterRegistry;

pub struct Scheduler {
    registry: Arc<HunterRegistry>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Starts ticking `registry` every `period`, first tick one period from
    /// now. Must be called from within a tokio runtime.
    pub fn spawn(registry: Arc<HunterRegistry>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run(Arc::clone(&registry), period, shutdown_rx));
        Self {
            registry,
            shutdown_tx,
            handle,
        }
    }

    pub fn registry(&self) -> &Arc<HunterRegistry> {
        &self.registry
    }

    /// Stops the loop, waits for it and batch-writes every hunter. Returns
    /// the number of rows written by the final flush.
    pub async fn shutdown(self) -> Result<usize> {
        // The loop only ends on this signal, so a send error means it already
        // died and the join below reports why.
        let _ = self.shutdown_tx.send(());
        self.handle.await.map_err(RuntimeError::SchedulerJoin)?;

        let flushed = self.registry.flush_all()?;
        info!(flushed, "scheduler stopped");
        Ok(flushed)
    }
}

async fn run(registry: Arc<HunterRegistry>, period: Duration, mut shutdown_rx: oneshot::Receiver<()>) {
    let period = period.max(Duration::from_millis(1));
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(period_ms = period.as_millis() as u64, "scheduler started");

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                debug!("scheduler shutdown requested");
                break;
            }

            tick = interval.tick() => {
                registry.tick_at(tick.into_std());
            }
        }
    }
}
