//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `request_census` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C handling
//! - JSON output of the run report
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use request_census::initialization::{init_cancellation, init_logger_with};
use request_census::source::CdpSource;
use request_census::{run_census, Config, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from(Opt::parse());

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let cancel = init_cancellation();
    let mut source = CdpSource::new(config.devtools.clone());

    match run_census(&config, &mut source, cancel).await {
        Ok(report) => {
            if config.json_output {
                let json = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize run report")?;
                println!("{}", json);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("request_census error: {:#}", e);
            process::exit(1);
        }
    }
}
