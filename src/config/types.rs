//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::app::validate_and_normalize_url;
use crate::classify::InclusionRule;
use crate::config::constants::{
    DEFAULT_DEVTOOLS_ENDPOINT, DEFAULT_INCLUDED_SCHEME, DEFAULT_TIMEOUT_MS,
};
use crate::error_handling::ConfigError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// Converted into a [`Config`] with `Config::from(opt)`.
#[derive(Debug, Parser)]
#[command(
    name = "request_census",
    version,
    about = "Open pages in a browser and count the unique URLs and domains it tries to connect to",
    after_help = "Example: request_census -u https://example.org/"
)]
pub struct Opt {
    /// URL to open. Can be specified multiple times.
    #[arg(short = 'u', long = "url", required = true, num_args = 1..)]
    pub url: Vec<String>,

    /// Time to wait after the page was loaded AND also used as a navigation timeout (ms).
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Run with verbose logging and list every recorded URL.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Log level (ignored when --verbose is set)
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// DevTools HTTP endpoint of a running Chromium
    #[arg(long, default_value = DEFAULT_DEVTOOLS_ENDPOINT)]
    pub devtools: String,

    /// Scheme of URLs recorded in the URL table. Can be specified multiple times.
    #[arg(long = "scheme", default_values_t = vec![DEFAULT_INCLUDED_SCHEME.to_string()])]
    pub schemes: Vec<String>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use request_census::Config;
///
/// let config = Config {
///     targets: vec!["https://example.org/".to_string()],
///     timeout_ms: 5_000,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Pages to open, processed one at a time in order
    pub targets: Vec<String>,

    /// Navigation timeout and post-load observation duration, in milliseconds
    pub timeout_ms: u64,

    /// List every recorded URL with its status
    pub verbose: bool,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// DevTools HTTP endpoint
    pub devtools: String,

    /// Schemes recorded in the URL table (empty means every scheme)
    pub include_schemes: Vec<String>,

    /// Print the run report as JSON on stdout
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            verbose: false,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            devtools: DEFAULT_DEVTOOLS_ENDPOINT.to_string(),
            include_schemes: vec![DEFAULT_INCLUDED_SCHEME.to_string()],
            json_output: false,
        }
    }
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        // --verbose means trace level, whatever --log-level says
        let log_level = if opt.verbose {
            LogLevel::Trace
        } else {
            opt.log_level
        };
        Self {
            targets: opt.url,
            timeout_ms: opt.timeout,
            verbose: opt.verbose,
            log_level,
            log_format: opt.log_format,
            devtools: opt.devtools,
            include_schemes: opt.schemes,
            json_output: opt.json,
        }
    }
}

impl Config {
    /// The configured timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Inclusion rule for the URL table.
    pub fn inclusion_rule(&self) -> InclusionRule {
        if self.include_schemes.is_empty() {
            InclusionRule::Any
        } else {
            InclusionRule::schemes(self.include_schemes.iter().map(String::as_str))
        }
    }

    /// Validates the configuration and returns the normalized targets.
    ///
    /// Targets that fail normalization are logged and skipped; the
    /// configuration is only invalid if none survive.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the timeout is zero, no targets are
    /// given, no target survives normalization, or a scheme is blank.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::NonPositiveTimeout);
        }
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.include_schemes.iter().any(|s| s.trim().is_empty()) {
            return Err(ConfigError::BlankScheme);
        }

        let targets: Vec<String> = self
            .targets
            .iter()
            .filter_map(|t| validate_and_normalize_url(t.trim()))
            .collect();

        if targets.is_empty() {
            return Err(ConfigError::NoValidTargets {
                rejected: self.targets.len(),
            });
        }
        Ok(targets)
    }
}
