//! Bounded-concurrency download pool.
//!
//! Spawns `concurrency` workers that pull from one shared queue, so at most
//! that many fetches are in flight. Workers consult the `PauseController`
//! before every claim and the ledger before every fetch.

mod summary;
mod worker;

pub use summary::{FailedItem, Summary};

use anyhow::{anyhow, bail, Result};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::CoursedlConfig;
use crate::control::PauseController;
use crate::fetcher::RetryingFetcher;
use crate::item::DownloadItem;
use crate::ledger::ProgressLedger;

/// Per-run knobs shared by all workers.
#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Item destinations are resolved against this directory.
    pub base_dir: PathBuf,
    /// Attempts per item (including the first).
    pub max_attempts: u32,
    /// Per-fetch timeout.
    pub timeout: Duration,
    /// How often a paused worker re-checks the run state.
    pub poll_interval: Duration,
}

impl PoolOptions {
    pub fn from_config(cfg: &CoursedlConfig) -> Self {
        Self {
            base_dir: cfg.base_dir.clone(),
            max_attempts: cfg.max_retries,
            timeout: cfg.timeout(),
            poll_interval: cfg.poll_interval(),
        }
    }
}

/// State shared by the workers of one run.
pub(crate) struct RunContext {
    pub(crate) fetcher: RetryingFetcher,
    pub(crate) ledger: Arc<ProgressLedger>,
    pub(crate) control: Arc<PauseController>,
    pub(crate) options: PoolOptions,
    pub(crate) queue: Mutex<VecDeque<DownloadItem>>,
    /// Set when a worker hits an unrecoverable error (ledger I/O); stops all claims.
    pub(crate) aborted: AtomicBool,
}

pub struct WorkerPool {
    fetcher: RetryingFetcher,
    ledger: Arc<ProgressLedger>,
    control: Arc<PauseController>,
    options: PoolOptions,
}

impl WorkerPool {
    pub fn new(
        fetcher: RetryingFetcher,
        ledger: Arc<ProgressLedger>,
        control: Arc<PauseController>,
        options: PoolOptions,
    ) -> Self {
        Self {
            fetcher,
            ledger,
            control,
            options,
        }
    }

    /// Process `items` with at most `concurrency` fetches in flight.
    ///
    /// Returns once every item reached a terminal state, or once Exiting was
    /// signaled and in-flight items finished. A failing item never aborts the
    /// run; a ledger write failure does, since progress could no longer be resumed.
    /// Items sharing a destination are rejected before anything is fetched.
    pub async fn run(&self, items: Vec<DownloadItem>, concurrency: usize) -> Result<Summary> {
        if concurrency < 1 {
            bail!("concurrency must be at least 1 (got {})", concurrency);
        }
        reject_shared_destinations(&items)?;
        let total = items.len();
        let ctx = Arc::new(RunContext {
            fetcher: self.fetcher.clone(),
            ledger: Arc::clone(&self.ledger),
            control: Arc::clone(&self.control),
            options: self.options.clone(),
            queue: Mutex::new(items.into()),
            aborted: AtomicBool::new(false),
        });

        tracing::info!(items = total, workers = concurrency, "download run starting");

        let mut join_set = tokio::task::JoinSet::new();
        for worker_id in 0..concurrency {
            join_set.spawn(worker::run_worker(Arc::clone(&ctx), worker_id));
        }

        let mut summary = Summary::default();
        let mut first_err = None;
        while let Some(res) = join_set.join_next().await {
            match res.map_err(|e| anyhow!("worker task join: {}", e))? {
                Ok(tally) => summary.merge(tally),
                Err(e) => {
                    tracing::error!("worker stopped: {:#}", e);
                    first_err.get_or_insert(e);
                }
            }
        }

        summary.not_started = ctx.queue.lock().unwrap_or_else(|e| e.into_inner()).len();
        tracing::info!("download run finished: {}", summary);

        match first_err {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

/// Two items writing one destination would interleave into the same `.part` file.
fn reject_shared_destinations(items: &[DownloadItem]) -> Result<()> {
    let mut owners: HashMap<PathBuf, &str> = HashMap::with_capacity(items.len());
    for item in items {
        if let Some(other) = owners.insert(item.normalized_destination(), &item.key) {
            bail!(
                "items {:?} and {:?} share destination {}",
                other,
                item.key,
                item.destination.display()
            );
        }
    }
    Ok(())
}
