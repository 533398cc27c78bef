//! Full strategy: startup, then protocol, each with half of the budget.

use std::time::Duration;

use super::{LaunchSpec, ProbeResult, TestStrategy, protocol, startup};

pub(super) async fn run(spec: &LaunchSpec, budget: Duration) -> ProbeResult {
    let half = budget / 2;

    let mut startup = startup::run(spec, half).await;
    if !startup.success {
        tracing::debug!(target: "probe", "Startup phase failed, skipping protocol phase");
        startup.strategy = TestStrategy::Full;
        startup.recommendations.insert(0, "Full test failed at startup phase".to_string());
        return startup;
    }

    let protocol = protocol::run(spec, half).await;
    combine(startup, protocol)
}

fn combine(startup: ProbeResult, protocol: ProbeResult) -> ProbeResult {
    let raw_output = format!(
        "Startup: {}\n\nProtocol: {}",
        startup.raw_output.unwrap_or_default(),
        protocol.raw_output.unwrap_or_default()
    );

    let recommendations = if protocol.success {
        vec![
            "Full server test passed - both startup and MCP protocol work correctly".to_string(),
            "Server is ready for production use".to_string(),
            "Configuration is complete and functional".to_string(),
        ]
    } else {
        let mut lines = vec![
            "Server starts successfully but MCP protocol test failed".to_string(),
            "Server may not implement MCP correctly or may have configuration issues".to_string(),
        ];
        lines.extend(protocol.recommendations);
        lines
    };

    ProbeResult {
        success: protocol.success,
        strategy: TestStrategy::Full,
        elapsed_ms: startup.elapsed_ms.saturating_add(protocol.elapsed_ms),
        error: protocol.error,
        raw_output: Some(raw_output),
        recommendations,
    }
}
