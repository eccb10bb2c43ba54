//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for configuration, classification, sources, and windows
//! - Processing statistics tracking (error counts per category)

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ClassifyError, ConfigError, ErrorType, InitializationError, SourceError, WindowError,
};
