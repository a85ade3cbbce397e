//! `coursedl run` – download a manifest through the worker pool.

use anyhow::Result;
use coursedl_core::config::CoursedlConfig;
use coursedl_core::control::PauseController;
use coursedl_core::fetcher::{CurlTransport, RetryingFetcher};
use coursedl_core::ledger::ProgressLedger;
use coursedl_core::manifest;
use coursedl_core::pool::{PoolOptions, WorkerPool};
use std::path::Path;
use std::sync::Arc;

use crate::cli::interrupt;

/// Failure report written next to the ledger.
const FAILURE_REPORT_NAME: &str = "download_errors.txt";

pub async fn run_downloads(cfg: &CoursedlConfig, manifest_path: &Path) -> Result<()> {
    let items = manifest::load(manifest_path)?;
    if items.is_empty() {
        println!("Manifest has no items.");
        return Ok(());
    }

    let ledger_path = cfg.ledger_path()?;
    let ledger = Arc::new(ProgressLedger::open(&ledger_path)?);
    let recovered = ledger.recover_interrupted()?;
    if recovered > 0 {
        tracing::info!("reset {} item(s) interrupted by a previous run", recovered);
    }

    let transport = Arc::new(CurlTransport::new(cfg.user_agent.clone()));
    let fetcher = RetryingFetcher::new(transport, cfg.retry_policy());
    let control = Arc::new(PauseController::new(cfg.double_interrupt_window()));
    let listener = interrupt::spawn_interrupt_listener(Arc::clone(&control));

    println!(
        "Downloading {} item(s) to {} ({} at a time). Ctrl-C pauses.",
        items.len(),
        cfg.base_dir.display(),
        cfg.concurrency
    );
    let pool = WorkerPool::new(fetcher, Arc::clone(&ledger), control, PoolOptions::from_config(cfg));
    let result = pool.run(items, cfg.concurrency).await;
    listener.abort();
    let summary = result?;

    println!(
        "Succeeded: {}  Failed: {}  Skipped: {}  Not started: {}",
        summary.succeeded, summary.failed, summary.skipped, summary.not_started
    );
    let report_path = ledger_path.with_file_name(FAILURE_REPORT_NAME);
    if summary.write_failure_report(&report_path)? {
        println!("Failures listed in {}", report_path.display());
    }
    if summary.not_started > 0 {
        println!("Run again to continue with the remaining items.");
    }
    Ok(())
}
