//! `coursedl status` – show the latest status of every recorded item.

use anyhow::Result;
use coursedl_core::config::CoursedlConfig;
use coursedl_core::ledger::ProgressLedger;

pub fn run_status(cfg: &CoursedlConfig, failed_only: bool) -> Result<()> {
    let ledger = ProgressLedger::open(cfg.ledger_path()?)?;

    if failed_only {
        let failures = ledger.failures();
        if failures.is_empty() {
            println!("No failed items.");
        }
        for f in failures {
            println!("[FAILED] {}\n  {}", f.key, f.detail);
        }
        return Ok(());
    }

    let entries = ledger.latest();
    if entries.is_empty() {
        println!("No items in ledger {}.", ledger.path().display());
        return Ok(());
    }
    println!("{:<12} {}", "STATUS", "KEY");
    for e in &entries {
        println!("{:<12} {}", e.status.as_str(), e.key);
    }
    let done = entries.iter().filter(|e| e.status.is_done()).count();
    println!("{} of {} item(s) done", done, entries.len());
    Ok(())
}
