//! Startup strategy: run the command briefly and see whether it holds up.

use std::time::{Duration, Instant};

use super::{LaunchSpec, ProbeFailure, ProbeResult, TestStrategy, classify_error};
use crate::constants::{OUTPUT_DRAIN_WINDOW, PROBE_OUTPUT_LIMIT, STARTUP_PROBE_CEILING};
use crate::process::{CapturedOutput, exit_parts};

const EXITED_OK: &[&str] = &[
    "Server command executed successfully",
    "This suggests the basic command and dependencies are available",
    "Consider running a protocol test for more thorough validation",
];

const STILL_RUNNING: &[&str] = &[
    "Server appears to be running (command did not exit immediately)",
    "This is typically good for MCP servers which run continuously",
    "The server was stopped after the test timeout to prevent hanging",
];

pub(super) async fn run(spec: &LaunchSpec, budget: Duration) -> ProbeResult {
    let started = Instant::now();
    let window = budget.min(STARTUP_PROBE_CEILING);

    let mut process = match spec.to_command("startup probe").spawn() {
        Ok(process) => process,
        Err(e) => {
            let failure = ProbeFailure::from_spawn_error(&spec.command, &e);
            tracing::debug!(target: "probe", "{}", failure);
            let recommendations = classify_error(&failure.to_string(), spec);
            return ProbeResult::failed(
                TestStrategy::Startup,
                started.elapsed(),
                &failure,
                String::new(),
                recommendations,
            );
        }
    };

    let mut output = CapturedOutput::new(PROBE_OUTPUT_LIMIT);
    let deadline = tokio::time::sleep(window);
    tokio::pin!(deadline);

    let status = loop {
        tokio::select! {
            biased;
            status = process.child.wait() => break Some(status),
            Some(event) = process.events.recv() => output.push(event),
            () = &mut deadline => break None,
        }
    };

    let Some(status) = status else {
        tracing::debug!(
            target: "probe",
            "Still running after {}ms, stopping it",
            window.as_millis()
        );
        process.terminate().await;
        process.drain(&mut output, OUTPUT_DRAIN_WINDOW).await;
        return ProbeResult::passed(
            TestStrategy::Startup,
            started.elapsed(),
            output.preferred_text(),
            STILL_RUNNING,
        );
    };

    let elapsed = started.elapsed();
    process.terminate().await;
    process.drain(&mut output, OUTPUT_DRAIN_WINDOW).await;

    let failure = match status {
        Ok(status) if status.success() => {
            return ProbeResult::passed(
                TestStrategy::Startup,
                elapsed,
                output.preferred_text(),
                EXITED_OK,
            );
        }
        Ok(status) => {
            let (code, signal) = exit_parts(status);
            ProbeFailure::CommandFailed {
                code,
                signal,
                command_line: spec.command_line(),
                stderr: output.stderr.text().trim().to_string(),
            }
        }
        Err(e) => ProbeFailure::CommandFailed {
            code: None,
            signal: None,
            command_line: spec.command_line(),
            stderr: e.to_string(),
        },
    };

    tracing::debug!(target: "probe", "{}", failure);
    let recommendations = classify_error(&failure.to_string(), spec);
    ProbeResult::failed(
        TestStrategy::Startup,
        elapsed,
        &failure,
        output.preferred_text(),
        recommendations,
    )
}
