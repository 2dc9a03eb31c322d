//! Owned worker pool for region tasks.
//!
//! The pool is created explicitly, handed to the coordinator, and shut down
//! explicitly. Worker exit is reported through a channel fed by the pool's
//! exit handler so shutdown can wait with a bound.

use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{info, trace};

use crate::config::RegionTickingConfig;
use crate::error::{TickError, TickResult};

/// Fixed-size pool running one task per region.
pub struct RegionExecutor {
    pool: ThreadPool,
    /// Receives the index of every worker that has exited.
    exits: Receiver<usize>,
    threads: usize,
}

impl RegionExecutor {
    /// Start a pool sized from the configuration.
    pub fn start(config: &RegionTickingConfig) -> TickResult<Self> {
        Self::with_threads(config.executor_thread_count)
    }

    /// Start a pool with an explicit worker count (at least one).
    pub fn with_threads(threads: usize) -> TickResult<Self> {
        let threads = threads.max(1);
        let (exit_tx, exits) = crossbeam_channel::unbounded();

        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("Region Ticking {index}"))
            .exit_handler(move |index| {
                // The receiver only goes away once shutdown stopped waiting
                let _ = exit_tx.send(index);
            })
            .build()?;

        info!(threads, "Started region ticking executor");

        Ok(Self {
            pool,
            exits,
            threads,
        })
    }

    #[must_use]
    pub const fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` inside the pool, so parallel iterators use its workers.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    pub(crate) const fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    /// Release the pool and wait up to `timeout` for every worker to exit.
    pub fn shutdown(self, timeout: Duration) -> TickResult<()> {
        info!("Shutting down region ticking executor...");

        let Self {
            pool,
            exits,
            threads,
        } = self;
        drop(pool);

        let deadline = Instant::now() + timeout;
        let mut remaining = threads;

        while remaining > 0 {
            match exits.recv_deadline(deadline) {
                Ok(index) => {
                    trace!(index, "Region worker exited");
                    remaining -= 1;
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TickError::ShutdownTimeout { timeout, remaining });
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Ok(())
    }
}

impl fmt::Debug for RegionExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegionExecutor")
            .field("threads", &self.threads)
            .finish()
    }
}
