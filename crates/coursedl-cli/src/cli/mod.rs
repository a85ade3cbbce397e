//! CLI for coursedl.

mod commands;
mod interrupt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use coursedl_core::config::{self, CoursedlConfig};
use std::path::PathBuf;

use commands::{run_downloads, run_status, run_verify};

/// Top-level CLI for coursedl.
#[derive(Debug, Parser)]
#[command(name = "coursedl")]
#[command(about = "coursedl: resumable course media downloader", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download every item of a manifest. Ctrl-C pauses/resumes, Ctrl-C twice quickly exits.
    Run {
        /// Manifest file (TOML `[[item]]` tables, or a JSON array if it ends in .json).
        manifest: PathBuf,
        /// Directory item destinations are resolved against.
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
        /// Items downloaded at the same time.
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,
        /// Attempts per item, including the first.
        #[arg(long, value_name = "N")]
        max_retries: Option<u32>,
        /// Per-fetch timeout in seconds.
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
        /// Ledger file (default: XDG state dir).
        #[arg(long, value_name = "FILE")]
        ledger: Option<PathBuf>,
    },

    /// Show the latest recorded status of every item.
    Status {
        #[arg(long, value_name = "FILE")]
        ledger: Option<PathBuf>,
        /// Only list failed items, with their error detail.
        #[arg(long)]
        failed: bool,
    },

    /// Compare the ledger with the files on disk.
    Verify {
        manifest: PathBuf,
        #[arg(long, value_name = "DIR")]
        base_dir: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        ledger: Option<PathBuf>,
        /// Also write the report as CSV.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub max_retries: Option<u32>,
    pub timeout: Option<u64>,
    pub ledger: Option<PathBuf>,
}

impl Overrides {
    pub(crate) fn apply(self, mut cfg: CoursedlConfig) -> Result<CoursedlConfig> {
        if let Some(dir) = self.base_dir {
            cfg.base_dir = dir;
        }
        if let Some(n) = self.concurrency {
            cfg.concurrency = n;
        }
        if let Some(n) = self.max_retries {
            cfg.max_retries = n;
        }
        if let Some(secs) = self.timeout {
            cfg.timeout_secs = secs;
        }
        if let Some(path) = self.ledger {
            cfg.ledger_path = Some(path);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Run {
                manifest,
                base_dir,
                concurrency,
                max_retries,
                timeout,
                ledger,
            } => {
                let cfg = Overrides {
                    base_dir,
                    concurrency,
                    max_retries,
                    timeout,
                    ledger,
                }
                .apply(cfg)?;
                run_downloads(&cfg, &manifest).await?;
            }
            CliCommand::Status { ledger, failed } => {
                let cfg = Overrides {
                    ledger,
                    ..Overrides::default()
                }
                .apply(cfg)?;
                run_status(&cfg, failed)?;
            }
            CliCommand::Verify {
                manifest,
                base_dir,
                ledger,
                output,
            } => {
                let cfg = Overrides {
                    base_dir,
                    ledger,
                    ..Overrides::default()
                }
                .apply(cfg)?;
                run_verify(&cfg, &manifest, output.as_deref())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
