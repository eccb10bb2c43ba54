//! request_census library: counts the destinations a page contacts
//!
//! Each target is opened through an [`ObservationSource`](source::ObservationSource)
//! and observed for a fixed window after it loads. Every request the page
//! issues or fails is folded into two deduplicated tables, one keyed by URL
//! and one keyed by host, where the last event for a key decides its status.
//! When the window closes, each table is summarized as total, succeeded and
//! failed counts.
//!
//! # Example
//!
//! ```no_run
//! use request_census::source::CdpSource;
//! use request_census::{run_census, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     targets: vec!["https://example.org/".to_string()],
//!     timeout_ms: 5_000,
//!     ..Default::default()
//! };
//!
//! let mut source = CdpSource::new(config.devtools.clone());
//! let report = run_census(&config, &mut source, CancellationToken::new()).await?;
//! println!("{} target(s), {} completed", report.targets.len(), report.completed());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime.

mod app;
pub mod classify;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod report;
pub mod source;
pub mod window;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use report::{Summary, TargetReport};
pub use run::{run_census, CensusReport, TargetOutcome};

// Internal run module (contains the per-target loop)
mod run {
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::Result;
    use log::{info, warn};
    use serde::Serialize;
    use tokio_util::sync::CancellationToken;

    use crate::app::{log_target_report, print_error_statistics};
    use crate::config::Config;
    use crate::error_handling::{ProcessingStats, WindowError};
    use crate::report::TargetReport;
    use crate::source::ObservationSource;
    use crate::window::ObservationWindow;

    /// What happened to one target.
    #[derive(Debug, Clone, Serialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    pub enum TargetOutcome {
        /// The window completed and produced its counts.
        Completed(TargetReport),
        /// The target failed; no counts were produced.
        Failed {
            /// Target URL
            target: String,
            /// Error category
            kind: String,
            /// Error message
            error: String,
        },
    }

    impl TargetOutcome {
        /// The report, if the target completed.
        pub fn report(&self) -> Option<&TargetReport> {
            match self {
                TargetOutcome::Completed(report) => Some(report),
                TargetOutcome::Failed { .. } => None,
            }
        }
    }

    /// Results of a census run, one outcome per attempted target in order.
    #[derive(Debug, Clone, Serialize)]
    pub struct CensusReport {
        /// Per-target outcomes
        pub targets: Vec<TargetOutcome>,
        /// Elapsed time in seconds
        pub elapsed_seconds: f64,
    }

    impl CensusReport {
        /// Number of targets that produced counts.
        pub fn completed(&self) -> usize {
            self.targets.iter().filter(|t| t.report().is_some()).count()
        }

        /// Number of targets that failed.
        pub fn failed(&self) -> usize {
            self.targets.len() - self.completed()
        }
    }

    /// Runs the census over every configured target, one at a time.
    ///
    /// A target that fails (navigation timeout, source error) is logged and
    /// recorded as [`TargetOutcome::Failed`]; the run moves on to the next
    /// one. When `cancel` fires, the current window ends early and no further
    /// targets are started.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`](crate::error_handling::ConfigError) (inside
    /// the `anyhow::Error`) when the configuration is invalid. Nothing is
    /// opened in that case.
    pub async fn run_census<S>(
        config: &Config,
        source: &mut S,
        cancel: CancellationToken,
    ) -> Result<CensusReport>
    where
        S: ObservationSource + ?Sized,
    {
        info!(
            "Starting {} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        );

        let targets = config.validate()?;
        let stats = Arc::new(ProcessingStats::new());
        let start_time = Instant::now();
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            if cancel.is_cancelled() {
                warn!("Run cancelled, not starting {}", target);
                break;
            }

            info!("Scraping {}...", target);
            let outcome = match observe_target(&target, config, source, &stats, &cancel).await {
                Ok(report) => {
                    log_target_report(&report);
                    TargetOutcome::Completed(report)
                }
                Err(e) => {
                    stats.increment_error(e.error_type());
                    warn!("Failed to scrape {}: {}", target, e);
                    TargetOutcome::Failed {
                        target,
                        kind: e.error_type().as_str().to_string(),
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        print_error_statistics(&stats);
        info!("Done!");

        Ok(CensusReport {
            targets: outcomes,
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
        })
    }

    /// One full window: navigate, observe, release the source, aggregate.
    async fn observe_target<S>(
        target: &str,
        config: &Config,
        source: &mut S,
        stats: &Arc<ProcessingStats>,
        cancel: &CancellationToken,
    ) -> Result<TargetReport, WindowError>
    where
        S: ObservationSource + ?Sized,
    {
        let mut window = ObservationWindow::new(
            target,
            config.inclusion_rule(),
            config.timeout(),
            Arc::clone(stats),
        );

        let observed = match window.begin_navigation(source, cancel).await {
            Ok(()) => window.observe(cancel).await,
            Err(e) => Err(e),
        };

        info!("Closing browsing context...");
        if let Err(e) = source.close().await {
            warn!("Failed to release browsing context for {}: {}", target, e);
        }

        observed?;
        window.close(config.verbose)
    }
}
