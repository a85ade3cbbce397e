//! Worker loop: wait while paused, claim, skip or fetch, record.

use anyhow::{Context, Result};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use super::summary::{FailedItem, Summary};
use super::RunContext;
use crate::control::PauseState;
use crate::item::{DownloadItem, ItemStatus};
use crate::storage;

enum Claim {
    Item(DownloadItem),
    /// State changed between the wait and the claim; wait again.
    NotRunning,
    Drained,
}

impl RunContext {
    fn claim(&self) -> Claim {
        let mut queue = self.queue.lock().unwrap_or_else(|e| e.into_inner());
        if self.control.current() != PauseState::Running {
            return Claim::NotRunning;
        }
        match queue.pop_front() {
            Some(item) => Claim::Item(item),
            None => Claim::Drained,
        }
    }
}

pub(super) async fn run_worker(ctx: Arc<RunContext>, worker_id: usize) -> Result<Summary> {
    let mut tally = Summary::default();
    loop {
        if !ctx
            .control
            .wait_until_runnable(ctx.options.poll_interval, &ctx.aborted)
            .await
        {
            tracing::debug!(worker_id, "run is exiting or aborted; worker stops claiming");
            break;
        }
        let item = match ctx.claim() {
            Claim::Item(item) => item,
            Claim::NotRunning => continue,
            Claim::Drained => break,
        };
        if let Err(e) = process_item(&ctx, item, &mut tally).await {
            ctx.aborted.store(true, Ordering::SeqCst);
            return Err(e);
        }
    }
    Ok(tally)
}

async fn process_item(ctx: &RunContext, item: DownloadItem, tally: &mut Summary) -> Result<()> {
    let status = ctx.ledger.status_of(&item.key);
    if status == ItemStatus::Succeeded {
        tracing::info!(key = %item.key, "already downloaded; skipping");
        tally.skipped += 1;
        return Ok(());
    }

    let destination = item.resolve(&ctx.options.base_dir);
    if storage::is_present(&destination) {
        tracing::info!(key = %item.key, path = %destination.display(), "file already present; skipping");
        if status != ItemStatus::Skipped {
            record(ctx, &item.key, ItemStatus::Skipped, "already present on disk").await?;
        }
        tally.skipped += 1;
        return Ok(());
    }

    record(ctx, &item.key, ItemStatus::InProgress, "").await?;
    tracing::info!(key = %item.key, url = %item.url, "downloading");

    let result = tokio::task::spawn_blocking({
        let fetcher = ctx.fetcher.clone();
        let url = item.url.clone();
        let destination = destination.clone();
        let max_attempts = ctx.options.max_attempts;
        let timeout = ctx.options.timeout;
        move || fetcher.fetch(&url, &destination, max_attempts, timeout)
    })
    .await
    .context("fetch task join")?;

    match result {
        Ok(bytes) => {
            record(ctx, &item.key, ItemStatus::Succeeded, &format!("{} bytes", bytes)).await?;
            tracing::info!(key = %item.key, bytes, "downloaded {}", destination.display());
            tally.succeeded += 1;
        }
        Err(e) => {
            let detail = e.ledger_detail();
            tracing::warn!(key = %item.key, "download failed: {}", detail);
            record(ctx, &item.key, ItemStatus::Failed(detail.clone()), &detail).await?;
            tally.failed += 1;
            tally.failures.push(FailedItem {
                key: item.key,
                url: item.url,
                detail,
            });
        }
    }
    Ok(())
}

async fn record(ctx: &RunContext, key: &str, status: ItemStatus, detail: &str) -> Result<()> {
    let ledger = Arc::clone(&ctx.ledger);
    let key = key.to_string();
    let detail = detail.to_string();
    tokio::task::spawn_blocking(move || ledger.record(&key, &status, &detail))
        .await
        .context("ledger task join")??;
    Ok(())
}
