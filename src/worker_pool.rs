//! # Worker Pool Module
//!
//! Bounded pool for blocking work: building the route table at startup and
//! repository access at request time.
//!
//! Jobs run on tokio's blocking threads via `spawn_blocking`; a semaphore
//! caps how many run at once so a burst of slow jobs cannot take every
//! blocking thread.
//!
//! ## Configuration
//!
//! - `blocking.workers` in the application config (default: 16)
//! - `BOUNCE_BLOCKING_WORKERS` overrides it

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error};

/// Default number of concurrent blocking jobs.
pub const DEFAULT_BLOCKING_WORKERS: usize = 16;

/// Configuration for a blocking pool
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// Maximum number of jobs running at once
    pub num_workers: usize,
}

impl WorkerPoolConfig {
    pub fn new(num_workers: usize) -> Self {
        Self {
            num_workers: num_workers.max(1),
        }
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKING_WORKERS)
    }
}

/// Metrics for a blocking pool
#[derive(Debug, Default)]
pub struct WorkerPoolMetrics {
    /// Jobs currently queued or running
    pub queue_depth: AtomicUsize,
    /// Total jobs dispatched
    pub dispatched_count: AtomicU64,
    /// Total jobs completed (successfully or not)
    pub completed_count: AtomicU64,
    /// Jobs that returned an error or panicked
    pub failed_count: AtomicU64,
}

impl WorkerPoolMetrics {
    fn record_dispatch(&self) {
        self.dispatched_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_add(1, Ordering::Relaxed);
    }

    fn record_completion(&self, failed: bool) {
        self.completed_count.fetch_add(1, Ordering::Relaxed);
        self.queue_depth.fetch_sub(1, Ordering::Relaxed);
        if failed {
            self.failed_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }

    pub fn get_dispatched_count(&self) -> u64 {
        self.dispatched_count.load(Ordering::Relaxed)
    }

    pub fn get_completed_count(&self) -> u64 {
        self.completed_count.load(Ordering::Relaxed)
    }

    pub fn get_failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }
}

/// Semaphore-bounded wrapper around `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct BlockingPool {
    name: Arc<str>,
    permits: Arc<Semaphore>,
    config: WorkerPoolConfig,
    metrics: Arc<WorkerPoolMetrics>,
}

impl BlockingPool {
    pub fn new(name: &str, config: WorkerPoolConfig) -> Self {
        debug!(pool = name, num_workers = config.num_workers, "Blocking pool created");
        Self {
            name: Arc::from(name),
            permits: Arc::new(Semaphore::new(config.num_workers)),
            config,
            metrics: Arc::new(WorkerPoolMetrics::default()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> &WorkerPoolConfig {
        &self.config
    }

    #[must_use]
    pub fn metrics(&self) -> &WorkerPoolMetrics {
        &self.metrics
    }

    /// Run `job` on a blocking thread once a permit is free.
    ///
    /// A job that panics fails with an error instead of unwinding into the
    /// caller.
    pub async fn run<F, T>(&self, job: F) -> anyhow::Result<T>
    where
        F: FnOnce() -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.metrics.record_dispatch();
        let permit = match Arc::clone(&self.permits).acquire_owned().await {
            Ok(permit) => permit,
            Err(err) => {
                self.metrics.record_completion(true);
                return Err(anyhow::anyhow!("blocking pool {} closed: {err}", self.name));
            }
        };

        let joined = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await;

        match joined {
            Ok(result) => {
                self.metrics.record_completion(result.is_err());
                result
            }
            Err(join_err) => {
                self.metrics.record_completion(true);
                error!(
                    pool = %self.name,
                    error = %join_err,
                    "Blocking job panicked or was cancelled"
                );
                Err(anyhow::anyhow!(
                    "blocking job in pool {} failed: {join_err}",
                    self.name
                ))
            }
        }
    }
}

impl Default for BlockingPool {
    fn default() -> Self {
        Self::new("blocking", WorkerPoolConfig::default())
    }
}
