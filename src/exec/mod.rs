//! Shell command runner behind `toolentry exec`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{EXEC_OUTPUT_LIMIT, OUTPUT_DRAIN_WINDOW};
use crate::process::{CapturedOutput, ServerCommand, exit_parts};

/// Outcome of one shell command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Exited with status zero
    pub success: bool,
    /// Exit code, absent when killed, timed out or never started
    pub exit_code: Option<i32>,
    /// Captured stdout, trimmed
    pub stdout: String,
    /// Captured stderr, trimmed, or the spawn error
    pub stderr: String,
    /// The command line as run by the shell
    pub command_line: String,
    /// Wall time in milliseconds
    pub execution_time: u64,
    /// Killed because the timeout elapsed
    pub timed_out: bool,
}

impl ExecResult {
    /// Process exit status for the CLI: the child's code, or 1.
    #[must_use]
    pub fn process_exit_code(&self) -> i32 {
        match self.exit_code {
            Some(code) if !self.timed_out => code,
            _ => 1,
        }
    }
}

/// Run `command_line` through the platform shell.
///
/// Never fails: spawn errors and timeouts are reported in the result.
pub async fn run_shell(command_line: &str, cwd: Option<&Path>, timeout: Duration) -> ExecResult {
    let mut command = ServerCommand::shell(command_line).with_context("exec");
    if let Some(dir) = cwd {
        command = command.current_dir(dir);
    }

    tracing::debug!(
        target: "exec",
        "Running `{}` with timeout {}ms",
        command_line,
        timeout.as_millis()
    );

    let mut process = match command.spawn() {
        Ok(process) => process,
        Err(e) => {
            tracing::debug!(target: "exec", "Spawn failed: {}", e);
            return ExecResult {
                success: false,
                exit_code: None,
                stdout: String::new(),
                stderr: format!("Failed to start shell: {e}"),
                command_line: command_line.to_string(),
                execution_time: 0,
                timed_out: false,
            };
        }
    };

    let mut output = CapturedOutput::new(EXEC_OUTPUT_LIMIT);
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    let status = loop {
        tokio::select! {
            Some(event) = process.events.recv() => output.push(event),
            status = process.child.wait() => break Some(status),
            () = &mut deadline => break None,
        }
    };

    let timed_out = status.is_none();
    if timed_out {
        tracing::warn!(
            target: "exec",
            "Command timed out after {}ms: {}",
            timeout.as_millis(),
            command_line
        );
        process.terminate().await;
    }
    process.drain(&mut output, OUTPUT_DRAIN_WINDOW).await;
    for (stream, buffer) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
        if buffer.is_truncated() {
            tracing::warn!(
                target: "exec",
                "Command {} exceeded {} bytes; the rest was dropped",
                stream,
                EXEC_OUTPUT_LIMIT
            );
        }
    }

    let (exit_code, success) = match status {
        Some(Ok(status)) => {
            let (code, signal) = exit_parts(status);
            if let Some(signal) = signal {
                tracing::debug!(target: "exec", "Command killed by signal {}", signal);
            }
            (code, status.success())
        }
        Some(Err(e)) => {
            tracing::warn!(target: "exec", "Failed to wait for command: {}", e);
            (None, false)
        }
        None => (None, false),
    };

    let execution_time = u64::try_from(process.elapsed().as_millis()).unwrap_or(u64::MAX);
    tracing::debug!(target: "exec", "Finished in {}ms with code {:?}", execution_time, exit_code);

    ExecResult {
        success,
        exit_code,
        stdout: output.stdout.text().trim().to_string(),
        stderr: output.stderr.text().trim().to_string(),
        command_line: command_line.to_string(),
        execution_time,
        timed_out,
    }
}
