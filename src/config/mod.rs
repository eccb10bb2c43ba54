//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, endpoints, limits)
//! - CLI option types and parsing
//! - Validation of the library configuration

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, Opt};
