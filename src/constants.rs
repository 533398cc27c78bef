//! Global constants used throughout the Toolentry codebase.
//!
//! Timeouts, output bounds and protocol values shared by the probe, the
//! shell runner and the CLI layer.

use std::time::Duration;

/// Upper bound on the startup phase of a probe (5 seconds).
///
/// Applied on top of the caller's budget, both for the standalone startup
/// strategy and for the startup half of the full strategy.
pub const STARTUP_PROBE_CEILING: Duration = Duration::from_secs(5);

/// Delay between spawning a server and sending the protocol request (1 second).
///
/// Slow interpreters (node, python) need this long before they read stdin.
/// Not configurable.
pub const PROTOCOL_WARMUP_DELAY: Duration = Duration::from_millis(1000);

/// Time a terminated process gets to exit before it is killed outright.
pub const TERMINATE_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// How long output readers are drained after the outcome is decided.
pub const OUTPUT_DRAIN_WINDOW: Duration = Duration::from_millis(200);

/// Smallest probe timeout accepted by the CLI, in milliseconds.
pub const MIN_PROBE_TIMEOUT_MS: u64 = 1_000;

/// Largest probe timeout accepted by the CLI, in milliseconds.
pub const MAX_PROBE_TIMEOUT_MS: u64 = 60_000;

/// Default probe timeout, in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 10_000;

/// Default timeout for `toolentry exec`, in milliseconds.
pub const DEFAULT_EXEC_TIMEOUT_MS: u64 = 30_000;

/// Output captured per stream while probing (100 KiB).
pub const PROBE_OUTPUT_LIMIT: usize = 100 * 1024;

/// Output captured per stream by `toolentry exec` (1 MiB).
pub const EXEC_OUTPUT_LIMIT: usize = 1024 * 1024;

/// Request id of the protocol probe's `tools/list` call.
pub const PROBE_REQUEST_ID: u64 = 1;

/// Method invoked by the protocol probe.
pub const PROBE_REQUEST_METHOD: &str = "tools/list";

/// Name under which the Toolentry server is installed.
pub const TOOLENTRY_SERVER_NAME: &str = "toolentry";
