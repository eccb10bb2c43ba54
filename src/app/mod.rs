//! Main application modules.
//!
//! This module provides target URL validation and the report and statistics
//! printing used by the run loop.

pub mod statistics;
pub mod url;

// Re-export public API
pub use statistics::{log_target_report, print_error_statistics};
pub use url::{truncate_for_log, validate_and_normalize_url};
