use serde_json::json;

use super::{TestEnv, stdout_json};

const REPLY: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"tools":[]}}"#;

/// Launch spec JSON for `sh -c <script>`.
fn sh(script: &str) -> String {
    json!({"command": "sh", "args": ["-c", script]}).to_string()
}

#[test]
fn test_invalid_json_still_prints_result() {
    let env = TestEnv::new();
    let output = env.command().args(["test", "{nope"]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert_eq!(result["test_type"], "startup");
    assert_eq!(result["error"], "Invalid JSON configuration provided");
    assert_eq!(result["recommendations"][0], "Failed to execute MCP server test");
}

#[test]
fn test_missing_args_field() {
    let env = TestEnv::new();
    let output = env.command().args(["test", r#"{"command":"npx"}"#]).output().unwrap();

    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().contains("command and args are required"));
}

#[test]
fn test_timeout_out_of_range() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["test", r#"{"command":"npx","args":[]}"#, "--timeout", "70000"])
        .output()
        .unwrap();

    let result = stdout_json(&output);
    assert_eq!(
        result["error"],
        "Invalid timeout. Must be between 1000 and 60000 milliseconds"
    );
}

#[test]
fn test_unparseable_flags_still_print_result() {
    let env = TestEnv::new();
    let spec = r#"{"command":"npx","args":[]}"#;

    let output = env.command().args(["test", spec, "--timeout", "abc"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert_eq!(
        result["error"],
        "Invalid timeout. Must be between 1000 and 60000 milliseconds"
    );

    let output = env.command().args(["test", spec, "--type", "bogus"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["test_type"], "startup");
    assert!(result["error"].as_str().unwrap().contains("bogus"));
}

#[test]
fn test_missing_binary() {
    let env = TestEnv::new();
    let spec = json!({"command": "definitely-not-a-real-binary-4711", "args": []}).to_string();
    let output = env.command().args(["test", &spec]).output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert!(result["error"].as_str().unwrap().contains("command not found"));
    let recs: Vec<&str> = result["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r.as_str())
        .collect();
    assert_eq!(recs.last(), Some(&"Use toolentry exec to install missing dependencies"));
}

#[cfg(unix)]
#[test]
fn test_startup_long_running_server_passes() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["test", &sh("echo ready; sleep 30"), "--timeout", "1500"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["success"], true);
    assert_eq!(result["command_output"], "ready");
    assert!(result["startup_time"].as_u64().unwrap() < 5_000);
}

#[cfg(unix)]
#[test]
fn test_startup_failed_command() {
    let env = TestEnv::new();
    let output = env.command().args(["test", &sh("echo boom >&2; exit 2")]).output().unwrap();

    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().starts_with("Command failed with exit code 2"));
    assert_eq!(result["command_output"], "boom");
}

#[cfg(unix)]
#[test]
fn test_protocol_reply() {
    let env = TestEnv::new();
    let script = format!("read line; echo '{REPLY}'; sleep 30");
    let output = env
        .command()
        .args(["test", &sh(&script), "--type", "protocol", "--timeout", "5000"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["test_type"], "protocol");
    assert!(result["command_output"].as_str().unwrap().starts_with("MCP Response: "));
}

#[cfg(unix)]
#[test]
fn test_protocol_early_exit() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["test", &sh("exit 1"), "-t", "protocol", "--timeout", "5000"])
        .output()
        .unwrap();

    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert_eq!(
        result["error"],
        "Server exited with exit code 1 before responding to MCP protocol test"
    );
}

#[cfg(unix)]
#[test]
fn test_protocol_silent_server_times_out() {
    let env = TestEnv::new();
    let started = std::time::Instant::now();
    let output = env
        .command()
        .args(["test", &sh("sleep 30"), "-t", "protocol", "--timeout", "2000"])
        .output()
        .unwrap();

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert!(result["error"].as_str().unwrap().contains("timed out"));
}

#[cfg(unix)]
#[test]
fn test_full_strategy_combines_phases() {
    let env = TestEnv::new();
    let script = format!("echo booting >&2; read line; echo '{REPLY}'; sleep 30");
    let output = env
        .command()
        .args(["test", &sh(&script), "--type", "full", "--timeout", "6000"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["test_type"], "full");
    let combined = result["command_output"].as_str().unwrap();
    assert!(combined.starts_with("Startup: "));
    assert!(combined.contains("\n\nProtocol: "));
}

#[cfg(unix)]
#[test]
fn test_full_strategy_stops_at_startup_failure() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["test", &sh("exit 5"), "--type", "full"])
        .output()
        .unwrap();

    let result = stdout_json(&output);
    assert_eq!(result["test_type"], "full");
    assert_eq!(result["success"], false);
    assert_eq!(result["recommendations"][0], "Full test failed at startup phase");
}

/// The probed server and its children are gone once `test` returns.
#[cfg(target_os = "linux")]
#[test]
fn test_no_process_left_behind() {
    let env = TestEnv::new();
    let pidfile = env.path("child.pid");
    let waits = format!("sleep 30 & echo $! > '{}'; wait", pidfile.display());
    let leaves = format!("sleep 37 & echo $! > '{}'", pidfile.display());

    let cases = [
        ("startup", &waits),
        ("protocol", &waits),
        ("startup", &leaves),
        ("protocol", &leaves),
    ];
    for (strategy, script) in cases {
        let _ = std::fs::remove_file(&pidfile);
        env.command()
            .args(["test", &sh(script), "-t", strategy, "--timeout", "1500"])
            .output()
            .unwrap();

        let pid: u32 = std::fs::read_to_string(&pidfile).unwrap().trim().parse().unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(3);
        while is_alive(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        assert!(!is_alive(pid), "{strategy} `{script}`: process {pid} survived");
    }
}

/// Running and not a zombie awaiting reaping by init.
#[cfg(target_os = "linux")]
fn is_alive(pid: u32) -> bool {
    std::fs::read_to_string(format!("/proc/{pid}/stat")).is_ok_and(|stat| {
        stat.rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state != "Z" && state != "X")
    })
}
