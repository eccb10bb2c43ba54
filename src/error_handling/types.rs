//! Error type definitions.
//!
//! This module defines the error types used throughout the application and
//! the [`ErrorType`] categories counted in the run statistics.

use std::time::Duration;

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

use crate::window::WindowState;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Invalid configuration. Aborts the run before any window is opened.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The timeout is zero.
    #[error("Invalid configuration: timeout must be a positive number of milliseconds")]
    NonPositiveTimeout,

    /// No target was given.
    #[error("Invalid configuration: at least one target URL is required")]
    NoTargets,

    /// Targets were given but none of them is a usable URL.
    #[error("Invalid configuration: none of the {rejected} target URL(s) is valid")]
    NoValidTargets {
        /// Number of targets rejected
        rejected: usize,
    },

    /// An inclusion scheme is empty or whitespace.
    #[error("Invalid configuration: inclusion schemes must not be blank")]
    BlankScheme,
}

/// Errors raised while classifying a single event.
///
/// None of these abort the observation window.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// The identity could not be parsed into a host. The URL table was still
    /// updated when the identity passed the inclusion rule.
    #[error("Malformed identity {identity:?}: {reason}")]
    MalformedIdentity {
        /// Raw identity as delivered by the source
        identity: String,
        /// Why no host could be derived
        reason: String,
    },
}

/// Errors raised by an observation source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP error talking to the DevTools endpoint.
    #[error("DevTools HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error on the DevTools connection.
    #[error("DevTools WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed DevTools message.
    #[error("DevTools serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The endpoint exposes no page target to attach to.
    #[error("No page target found at DevTools endpoint {0}")]
    NoPageTarget(String),

    /// The browser rejected a command.
    #[error("Browser returned an error (code {code}): {message}")]
    Protocol {
        /// DevTools error code
        code: i64,
        /// DevTools error message
        message: String,
    },

    /// The browser could not navigate to the target.
    #[error("Navigation to {target} failed: {reason}")]
    NavigationFailed {
        /// Target URL
        target: String,
        /// Browser-provided reason (e.g. `net::ERR_NAME_NOT_RESOLVED`)
        reason: String,
    },

    /// A command got no reply in time.
    #[error("Command {method} timed out after {timeout:?}")]
    CommandTimeout {
        /// DevTools method name
        method: String,
        /// Timeout that elapsed
        timeout: Duration,
    },

    /// The source has no script for the requested target.
    #[error("No scripted events for target {0}")]
    UnknownTarget(String),

    /// The connection to the browser went away.
    #[error("Connection to the browser lost")]
    Disconnected,
}

/// Per-target errors. They close the window without a summary but never stop
/// the run.
#[derive(Error, Debug)]
pub enum WindowError {
    /// The page did not signal load completion in time.
    #[error("Navigation to {target} timed out after {timeout:?}")]
    NavigationTimeout {
        /// Target URL
        target: String,
        /// Navigation timeout that elapsed
        timeout: Duration,
    },

    /// The run was cancelled before the page finished loading.
    #[error("Navigation to {target} cancelled")]
    Cancelled {
        /// Target URL
        target: String,
    },

    /// A lifecycle step was called in the wrong state.
    #[error("Cannot {action} a window in state {state:?}")]
    InvalidTransition {
        /// Current state
        state: WindowState,
        /// Attempted step
        action: &'static str,
    },

    /// The observation source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl WindowError {
    /// Statistics category for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            WindowError::NavigationTimeout { .. } => ErrorType::NavigationTimeout,
            WindowError::Cancelled { .. } => ErrorType::Cancelled,
            WindowError::InvalidTransition { .. } => ErrorType::InvalidTransition,
            WindowError::Source(_) => ErrorType::SourceFailure,
        }
    }
}

/// Categories of errors counted during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    MalformedIdentity,
    NavigationTimeout,
    SourceFailure,
    Cancelled,
    InvalidTransition,
}

impl ErrorType {
    /// Returns a human-readable string representation of the error type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::MalformedIdentity => "Malformed identity",
            ErrorType::NavigationTimeout => "Navigation timeout",
            ErrorType::SourceFailure => "Observation source failure",
            ErrorType::Cancelled => "Cancelled",
            ErrorType::InvalidTransition => "Invalid window transition",
        }
    }
}
