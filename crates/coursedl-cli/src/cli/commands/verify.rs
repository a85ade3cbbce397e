//! `coursedl verify` – compare the ledger with the files on disk.

use anyhow::Result;
use coursedl_core::config::CoursedlConfig;
use coursedl_core::ledger::ProgressLedger;
use coursedl_core::{manifest, validate};
use std::path::Path;

pub fn run_verify(cfg: &CoursedlConfig, manifest_path: &Path, output: Option<&Path>) -> Result<()> {
    let items = manifest::load(manifest_path)?;
    let ledger = ProgressLedger::open(cfg.ledger_path()?)?;
    let report = validate::validate(&items, &cfg.base_dir, &ledger);

    for row in report.discrepancies() {
        if let Some(issue) = row.issue {
            println!("{:<11} {:<12} {}", issue.as_str(), row.recorded.as_str(), row.key);
        }
    }
    println!(
        "Checked {} item(s), {} discrepanc{}.",
        report.checked(),
        report.discrepancy_count(),
        if report.discrepancy_count() == 1 { "y" } else { "ies" }
    );
    if let Some(path) = output {
        report.write_csv(path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}
