//! Ctrl-C handling during `coursedl run`.
//!
//! One interrupt toggles pause; a second one inside the double-interrupt
//! window stops new claims. An interrupt after that exits immediately.

use coursedl_core::control::{PauseController, PauseState};
use std::sync::Arc;

/// Exit status for a forced stop, as a shell reports SIGINT.
const FORCED_EXIT_CODE: i32 = 130;

pub fn spawn_interrupt_listener(control: Arc<PauseController>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("cannot listen for Ctrl-C: {}", e);
                return;
            }
            if control.current() == PauseState::Exiting {
                eprintln!("\nForced exit; in-flight downloads are abandoned.");
                tracing::warn!("forced exit on repeated interrupt");
                std::process::exit(FORCED_EXIT_CODE);
            }
            match control.on_interrupt() {
                PauseState::Paused => {
                    eprintln!("\nPaused. In-flight downloads will finish. Ctrl-C to resume, twice quickly to exit.");
                }
                PauseState::Running => eprintln!("\nResumed."),
                PauseState::Exiting => {
                    eprintln!("\nExiting after in-flight downloads finish. Ctrl-C again to force.");
                }
            }
            tracing::info!(state = ?control.current(), "interrupt received");
        }
    })
}
