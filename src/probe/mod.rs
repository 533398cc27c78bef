//! Server liveness and protocol probe.
//!
//! A probe launches a candidate MCP server from a [`LaunchSpec`], interrogates
//! it with one [`TestStrategy`] inside a [`TimeoutBudget`], and always comes
//! back with exactly one [`ProbeResult`]. Nothing escapes as an error: spawn
//! failures, timeouts and early exits are all folded into the result along
//! with remediation hints.
//!
//! # Strategies
//!
//! - [`TestStrategy::Startup`] runs the command for at most
//!   [`STARTUP_PROBE_CEILING`]. A command that is still running when that
//!   elapses counts as a healthy resident server.
//! - [`TestStrategy::Protocol`] sends one `tools/list` JSON-RPC request after
//!   a fixed warm-up and waits for a reply on stdout.
//! - [`TestStrategy::Full`] runs both, splitting the budget in half.
//!
//! The spawned process never outlives the call: every path ends with the
//! child exited or terminated and reaped.
//!
//! [`STARTUP_PROBE_CEILING`]: crate::constants::STARTUP_PROBE_CEILING

mod classify;
mod full;
mod protocol;
mod startup;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_PROBE_TIMEOUT_MS, MIN_PROBE_TIMEOUT_MS};
use crate::core::ToolentryError;
use crate::process::ServerCommand;

pub use classify::{ErrorCategory, classify_error};
pub use protocol::{ReplyScanner, is_reply, request_line};

/// How to start the server under test.
///
/// `args` is required even when empty. Unknown keys such as `type` are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchSpec {
    /// Program to run
    pub command: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Variables layered over the inherited environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
}

impl LaunchSpec {
    /// Spec with no environment overlay.
    pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            env: None,
        }
    }

    /// Whether the spec declares at least one environment variable.
    #[must_use]
    pub fn has_env(&self) -> bool {
        self.env.as_ref().is_some_and(|env| !env.is_empty())
    }

    /// Command and arguments joined by spaces.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Builder spawning this spec directly, through `cmd /C` on Windows so
    /// `.cmd` shims such as `npx` resolve.
    pub(crate) fn to_command(&self, context: &str) -> ServerCommand {
        let command = if crate::utils::is_windows() {
            ServerCommand::new("cmd").arg("/C").arg(&self.command)
        } else {
            ServerCommand::new(&self.command)
        };
        let command = command.args(self.args.iter().cloned()).with_context(context);
        match &self.env {
            Some(env) => command.envs(env.iter().map(|(k, v)| (k.clone(), v.clone()))),
            None => command,
        }
    }
}

/// Depth of the probe.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TestStrategy {
    /// Start the command and watch it briefly
    #[default]
    Startup,
    /// Exchange one JSON-RPC request
    Protocol,
    /// Startup followed by protocol
    Full,
}

impl fmt::Display for TestStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Startup => "startup",
            Self::Protocol => "protocol",
            Self::Full => "full",
        })
    }
}

/// Wall-clock budget for one probe, validated to
/// [`MIN_PROBE_TIMEOUT_MS`]..=[`MAX_PROBE_TIMEOUT_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeoutBudget(Duration);

impl TimeoutBudget {
    /// Validate a millisecond budget.
    pub fn from_millis(ms: u64) -> Result<Self, ToolentryError> {
        if !(MIN_PROBE_TIMEOUT_MS..=MAX_PROBE_TIMEOUT_MS).contains(&ms) {
            return Err(ToolentryError::InvalidTimeout {
                min: MIN_PROBE_TIMEOUT_MS,
                max: MAX_PROBE_TIMEOUT_MS,
            });
        }
        Ok(Self(Duration::from_millis(ms)))
    }

    /// The budget as a duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

/// Why a probe failed, before it is rendered into a [`ProbeResult`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// The command could not be launched
    #[error("Failed to start '{command}': {reason}")]
    SpawnFailure {
        /// Program that failed to start
        command: String,
        /// OS error, already phrased for humans
        reason: String,
    },
    /// No reply arrived within the budget
    #[error("MCP protocol test timed out - server may not be responding to JSON-RPC requests")]
    Timeout {
        /// Budget that elapsed
        after_ms: u64,
    },
    /// The server exited before replying to the protocol request
    #[error("Server exited with {} before responding to MCP protocol test", describe_exit(.code, .signal))]
    EarlyExit {
        /// Exit code, when the process exited normally
        code: Option<i32>,
        /// Terminating signal, on Unix
        signal: Option<i32>,
    },
    /// A startup run exited on its own with a failure status
    #[error("Command failed with {}: {command_line}{}", describe_exit(.code, .signal), stderr_suffix(.stderr))]
    CommandFailed {
        /// Exit code, when the process exited normally
        code: Option<i32>,
        /// Terminating signal, on Unix
        signal: Option<i32>,
        /// Command and arguments
        command_line: String,
        /// Trimmed stderr
        stderr: String,
    },
}

impl ProbeFailure {
    /// Build a [`ProbeFailure::SpawnFailure`] from an OS error.
    #[must_use]
    pub fn from_spawn_error(command: &str, error: &std::io::Error) -> Self {
        let reason = match error.kind() {
            std::io::ErrorKind::NotFound => format!("command not found ({error})"),
            std::io::ErrorKind::PermissionDenied => format!("permission denied ({error})"),
            _ => error.to_string(),
        };
        Self::SpawnFailure {
            command: command.to_string(),
            reason,
        }
    }
}

fn describe_exit(code: &Option<i32>, signal: &Option<i32>) -> String {
    match (code, signal) {
        (Some(code), _) => format!("exit code {code}"),
        (None, Some(signal)) => format!("signal {signal}"),
        (None, None) => "an unknown status".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{stderr}")
    }
}

/// The single record every probe produces.
///
/// Serialized keys: `success`, `test_type`, `startup_time` (milliseconds),
/// `error` and `command_output` (only when present), `recommendations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Whether the probe passed
    pub success: bool,
    /// Strategy that produced this result
    #[serde(rename = "test_type")]
    pub strategy: TestStrategy,
    /// Elapsed wall time in milliseconds
    #[serde(rename = "startup_time")]
    pub elapsed_ms: u64,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Output snippet for diagnostics
    #[serde(rename = "command_output", default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Remediation or confirmation hints, never empty
    pub recommendations: Vec<String>,
}

impl ProbeResult {
    pub(crate) fn passed(
        strategy: TestStrategy,
        elapsed: Duration,
        raw_output: String,
        recommendations: &[&str],
    ) -> Self {
        Self {
            success: true,
            strategy,
            elapsed_ms: millis(elapsed),
            error: None,
            raw_output: non_empty(raw_output),
            recommendations: recommendations.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    pub(crate) fn failed(
        strategy: TestStrategy,
        elapsed: Duration,
        failure: &ProbeFailure,
        raw_output: String,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            success: false,
            strategy,
            elapsed_ms: millis(elapsed),
            error: Some(failure.to_string()),
            raw_output: non_empty(raw_output),
            recommendations,
        }
    }

    /// Result for input that never reached the probe (malformed JSON,
    /// bad timeout).
    #[must_use]
    pub fn invalid_input(strategy: TestStrategy, message: impl Into<String>) -> Self {
        Self {
            success: false,
            strategy,
            elapsed_ms: 0,
            error: Some(message.into()),
            raw_output: None,
            recommendations: vec![
                "Failed to execute MCP server test".to_string(),
                "Check command syntax and configuration".to_string(),
            ],
        }
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Probe `spec` with `strategy` inside `budget`.
pub async fn run_probe(
    spec: &LaunchSpec,
    budget: TimeoutBudget,
    strategy: TestStrategy,
) -> ProbeResult {
    tracing::info!(
        target: "probe",
        "Testing MCP server: {} ({} test, timeout {}ms)",
        spec.command_line(),
        strategy,
        budget.as_duration().as_millis()
    );

    let result = match strategy {
        TestStrategy::Startup => startup::run(spec, budget.as_duration()).await,
        TestStrategy::Protocol => protocol::run(spec, budget.as_duration()).await,
        TestStrategy::Full => full::run(spec, budget.as_duration()).await,
    };

    tracing::debug!(
        target: "probe",
        "{} test finished in {}ms: success={}",
        strategy,
        result.elapsed_ms,
        result.success
    );
    result
}
