//! Poll loop.
//!
//! One pass over the pending set, then a fixed sleep, forever. The
//! sleep starts after the pass finishes, so the true cycle period is
//! the configured interval plus however long the pass took. Strictly
//! sequential: no overlap between passes, no concurrency within one.

use anyhow::Result;
use std::time::Duration;
use tracing::{debug, info};

use crate::engine::executor::TaskExecutor;
use crate::storage::TaskStore;

pub struct Agent {
    store: TaskStore,
    executor: TaskExecutor,
    poll_interval: Duration,
}

impl Agent {
    pub fn new(store: TaskStore, executor: TaskExecutor, poll_interval: Duration) -> Self {
        Self {
            store,
            executor,
            poll_interval,
        }
    }

    /// Run until a Ctrl-C arrives. A pass that stalls on a hung
    /// external call stalls the whole loop; there is no per-task
    /// timeout beyond what the chain client enforces.
    pub async fn run(&self) -> Result<()> {
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.poll_interval.as_secs(),
            "Entering poll loop. Press Ctrl+C to stop."
        );

        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            let report = self.executor.process_pending(&self.store).await;
            if report.processed > 0 {
                info!(cycle, %report, "Pass complete");
            } else {
                debug!(cycle, "No pending tasks");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }

        Ok(())
    }
}
