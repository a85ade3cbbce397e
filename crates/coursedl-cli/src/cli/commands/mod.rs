//! CLI command handlers, one file per subcommand.

mod run;
mod status;
mod verify;

pub use run::run_downloads;
pub use status::run_status;
pub use verify::run_verify;
