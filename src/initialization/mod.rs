//! Application initialization.
//!
//! This module sets up process-wide resources:
//! - The logger
//! - The cancellation token tied to Ctrl-C

mod logger;

use log::warn;
use tokio_util::sync::CancellationToken;

// Re-export public API
pub use logger::init_logger_with;

/// Creates the run's cancellation token and cancels it on Ctrl-C.
///
/// Cancelling ends the current window early; the run stops before the next
/// target. Must be called inside a Tokio runtime.
pub fn init_cancellation() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, finishing the current target early");
                on_signal.cancel();
            }
            Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
        }
    });
    cancel
}
