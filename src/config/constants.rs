//! Configuration constants.
//!
//! Defaults used by the CLI and by [`Config::default`](super::Config), plus a
//! few operational limits that are not exposed as options.

use std::time::Duration;

/// Default wait after load, in milliseconds. Also the navigation timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// DevTools HTTP endpoint of an already running Chromium
/// (`chromium --remote-debugging-port=9222`).
pub const DEFAULT_DEVTOOLS_ENDPOINT: &str = "127.0.0.1:9222";

/// Scheme recorded in the URL table when no `--scheme` is given.
pub const DEFAULT_INCLUDED_SCHEME: &str = "https";

/// Capacity of the per-window event channel between a source and its window.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Timeout for DevTools commands other than `Page.navigate`.
pub const DEVTOOLS_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum target URL length (2048 characters), matching common browser and
/// server limits.
pub const MAX_URL_LENGTH: usize = 2048;

/// Number of characters of an identity kept when it is quoted in a log line.
pub const LOGGED_IDENTITY_PREFIX: usize = 80;
