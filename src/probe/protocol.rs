//! Protocol strategy: one `tools/list` round trip over stdio.
//!
//! After [`PROTOCOL_WARMUP_DELAY`] the request line is written to the
//! server's stdin. Three events race: a reply on stdout, the server exiting,
//! and the budget elapsing. They all feed one `select!`, so the first one to
//! fire decides the outcome and the others are dropped with it. The budget
//! is polled first, so a server that never stops writing still times out.

use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::io::AsyncWriteExt;

use super::{LaunchSpec, ProbeFailure, ProbeResult, TestStrategy, millis};
use crate::constants::{
    OUTPUT_DRAIN_WINDOW, PROBE_OUTPUT_LIMIT, PROBE_REQUEST_ID, PROBE_REQUEST_METHOD,
    PROTOCOL_WARMUP_DELAY,
};
use crate::process::{CapturedOutput, RunningProcess, StreamEvent, exit_parts};

const REPLIED: &[&str] = &[
    "MCP protocol test passed - server correctly implements JSON-RPC",
    "Server responded to tools/list request successfully",
    "MCP server appears to be fully functional",
];

const TIMED_OUT: &[&str] = &[
    "Server process may be running but not implementing MCP protocol correctly",
    "Check server logs for JSON-RPC parsing errors",
    "Ensure server supports MCP protocol version compatibility",
];

const EXITED: &[&str] = &[
    "Server started but exited immediately - may have configuration issues",
    "Check server logs for startup errors",
    "Verify environment variables and dependencies are correct",
];

const SPAWN_FAILED: &[&str] = &[
    "Failed to start MCP server process",
    "Check that the command and arguments are correct",
    "Ensure all dependencies are installed",
];

#[derive(Serialize)]
struct ProbeRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Map<String, Value>,
}

/// The newline-terminated `tools/list` request line.
#[must_use]
pub fn request_line() -> String {
    let request = ProbeRequest {
        jsonrpc: "2.0",
        id: PROBE_REQUEST_ID,
        method: PROBE_REQUEST_METHOD,
        params: Map::new(),
    };
    // Serializing a struct of strings and a map cannot fail.
    let mut line = serde_json::to_string(&request).unwrap_or_default();
    line.push('\n');
    line
}

/// Whether `value` is a JSON-RPC 2.0 reply: `jsonrpc == "2.0"` and a
/// `result` or `error` key.
#[must_use]
pub fn is_reply(value: &Value) -> bool {
    value.get("jsonrpc").and_then(Value::as_str) == Some("2.0")
        && (value.get("result").is_some() || value.get("error").is_some())
}

/// Line scanner over a server's stdout.
///
/// Chunks may split lines anywhere. Complete lines are checked as they
/// arrive and the unterminated tail is retried after every chunk. Banners,
/// log lines and partial JSON are skipped.
#[derive(Debug, Default)]
pub struct ReplyScanner {
    pending: Vec<u8>,
}

impl ReplyScanner {
    /// Feed one chunk; returns the first reply found.
    ///
    /// Runs in time linear in the chunk plus the carried-over tail.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Value> {
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            let reply = parse_reply(&self.pending[start..end]);
            start = end + 1;
            if reply.is_some() {
                self.pending.drain(..start);
                return reply;
            }
        }
        self.pending.drain(..start);

        if let Some(reply) = parse_reply(&self.pending) {
            self.pending.clear();
            return Some(reply);
        }
        if self.pending.len() > PROBE_OUTPUT_LIMIT {
            self.pending.clear();
        }
        None
    }
}

fn parse_reply(line: &[u8]) -> Option<Value> {
    let text = std::str::from_utf8(line).ok()?.trim();
    if !text.starts_with('{') {
        return None;
    }
    let value: Value = serde_json::from_str(text).ok()?;
    is_reply(&value).then_some(value)
}

enum Outcome {
    Replied(Value),
    Exited(std::io::Result<std::process::ExitStatus>),
    TimedOut,
}

pub(super) async fn run(spec: &LaunchSpec, budget: Duration) -> ProbeResult {
    let started = Instant::now();

    let mut process = match spec.to_command("protocol probe").spawn() {
        Ok(process) => process,
        Err(e) => {
            let failure = ProbeFailure::from_spawn_error(&spec.command, &e);
            tracing::debug!(target: "probe", "{}", failure);
            return ProbeResult::failed(
                TestStrategy::Protocol,
                started.elapsed(),
                &failure,
                String::new(),
                owned(SPAWN_FAILED),
            );
        }
    };

    let mut scanner = ReplyScanner::default();
    let mut output = CapturedOutput::new(PROBE_OUTPUT_LIMIT);
    let mut request_sent = false;

    let warmup = tokio::time::sleep(PROTOCOL_WARMUP_DELAY);
    let deadline = tokio::time::sleep(budget);
    tokio::pin!(warmup, deadline);

    let outcome = loop {
        tokio::select! {
            biased;
            () = &mut deadline => break Outcome::TimedOut,
            () = &mut warmup, if !request_sent => {
                request_sent = true;
                send_request(&mut process).await;
            }
            Some(event) = process.events.recv() => {
                if let Some(reply) = observe(&mut scanner, &mut output, event) {
                    break Outcome::Replied(reply);
                }
            }
            status = process.child.wait() => break Outcome::Exited(status),
        }
    };

    // Output that was already written when the server exited still counts.
    let outcome = match outcome {
        Outcome::Exited(status) => {
            let limit = drain_limit(budget.saturating_sub(started.elapsed()));
            match drain_for_reply(&mut process, &mut scanner, &mut output, limit).await {
                Some(reply) => Outcome::Replied(reply),
                None => Outcome::Exited(status),
            }
        }
        other => other,
    };

    let elapsed = started.elapsed();
    process.terminate().await;

    match outcome {
        Outcome::Replied(reply) => {
            tracing::debug!(target: "probe", "Reply after {}ms", elapsed.as_millis());
            let pretty = serde_json::to_string_pretty(&reply).unwrap_or_else(|_| reply.to_string());
            ProbeResult::passed(
                TestStrategy::Protocol,
                elapsed,
                format!("MCP Response: {pretty}"),
                REPLIED,
            )
        }
        Outcome::TimedOut => {
            process.drain(&mut output, OUTPUT_DRAIN_WINDOW).await;
            let failure = ProbeFailure::Timeout { after_ms: millis(budget) };
            tracing::debug!(target: "probe", "No reply within {}ms", budget.as_millis());
            ProbeResult::failed(
                TestStrategy::Protocol,
                elapsed,
                &failure,
                output.preferred_text(),
                owned(TIMED_OUT),
            )
        }
        Outcome::Exited(status) => {
            let (code, signal) = match status {
                Ok(status) => exit_parts(status),
                Err(e) => {
                    tracing::debug!(target: "probe", "Failed to wait for server: {}", e);
                    (None, None)
                }
            };
            let failure = ProbeFailure::EarlyExit { code, signal };
            tracing::debug!(target: "probe", "{}", failure);
            ProbeResult::failed(
                TestStrategy::Protocol,
                elapsed,
                &failure,
                output.preferred_text(),
                owned(EXITED),
            )
        }
    }
}

fn observe(
    scanner: &mut ReplyScanner,
    output: &mut CapturedOutput,
    event: StreamEvent,
) -> Option<Value> {
    let reply = match &event {
        StreamEvent::Stdout(chunk) => scanner.push(chunk),
        StreamEvent::Stderr(_) => None,
    };
    output.push(event);
    reply
}

/// Total time spent reading after exit: ten idle windows, cut to what is
/// left of the budget but never below one window.
fn drain_limit(remaining: Duration) -> Duration {
    (OUTPUT_DRAIN_WINDOW * 10).min(remaining.max(OUTPUT_DRAIN_WINDOW))
}

/// Read output still in flight after exit. Background children may keep
/// the pipe open, so reading stops at `limit` even while chunks keep coming.
async fn drain_for_reply(
    process: &mut RunningProcess,
    scanner: &mut ReplyScanner,
    output: &mut CapturedOutput,
    limit: Duration,
) -> Option<Value> {
    let deadline = Instant::now() + limit;
    loop {
        let wait = OUTPUT_DRAIN_WINDOW.min(deadline.saturating_duration_since(Instant::now()));
        if wait.is_zero() {
            tracing::debug!(target: "probe", "Output still flowing after exit, giving up");
            return None;
        }
        match tokio::time::timeout(wait, process.events.recv()).await {
            Ok(Some(event)) => {
                if let Some(reply) = observe(scanner, output, event) {
                    return Some(reply);
                }
            }
            _ => return None,
        }
    }
}

/// Write the request unless the server is already gone. Write errors mean
/// the server closed stdin or died, which the exit branch reports.
async fn send_request(process: &mut RunningProcess) {
    if process.has_exited() {
        tracing::debug!(target: "probe", "Server exited before the request was sent");
        return;
    }
    let Some(stdin) = process.stdin.as_mut() else {
        return;
    };

    let line = request_line();
    tracing::debug!(target: "probe", "Sending request: {}", line.trim_end());
    let written = match stdin.write_all(line.as_bytes()).await {
        Ok(()) => stdin.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        tracing::debug!(target: "probe", "Request write ignored: {}", e);
    }
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|s| (*s).to_string()).collect()
}
