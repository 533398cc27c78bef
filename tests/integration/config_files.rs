use predicates::prelude::*;
use serde_json::{Value, json};

use super::TestEnv;

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_write_then_read_custom_path() {
    let env = TestEnv::new();
    let path = env.path("custom.json");

    env.command()
        .args(["write", r#"{"mcpServers":{"fs":{"command":"npx","args":[]}}}"#, "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration written successfully to:"));

    let output = env.command().args(["read", "--path"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    assert_eq!(
        super::stdout_json(&output),
        json!({"mcpServers": {"fs": {"command": "npx", "args": []}}})
    );
}

#[test]
fn test_read_missing_custom_file() {
    let env = TestEnv::new();
    env.command()
        .args(["read", "--path"])
        .arg(env.path("nope.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_read_uninstalled_client() {
    let env = TestEnv::new();
    env.command()
        .args(["read", "windsurf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not appear to be installed"));
}

#[test]
fn test_read_client_under_home() {
    let env = TestEnv::new();
    let path = env.path(".codeium/windsurf/mcp_config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{"mcpServers":{}}"#).unwrap();

    let output = env.command().args(["read", "windsurf"]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(super::stdout_json(&output), json!({"mcpServers": {}}));
}

#[test]
fn test_unknown_client_lists_supported_ones() {
    let env = TestEnv::new();
    env.command()
        .args(["read", "notepad"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("claude-desktop"));
}

#[test]
fn test_write_needs_force_for_missing_directory() {
    let env = TestEnv::new();
    let path = env.path("deep/dir/config.json");

    env.command().args(["write", "{}", "--path"]).arg(&path).assert().failure();
    assert!(!path.exists());

    env.command().args(["write", "{}", "--force", "--path"]).arg(&path).assert().success();
    assert_eq!(read_json(&path), json!({}));
}

#[test]
fn test_write_rejects_invalid_json() {
    let env = TestEnv::new();
    let path = env.path("config.json");
    env.command()
        .args(["write", "{broken", "--path"])
        .arg(&path)
        .assert()
        .failure();
    assert!(!path.exists());
}

#[test]
fn test_autoinstall_merges_and_reports_replacements() {
    let env = TestEnv::new();
    let path = env.path("mcp.json");
    std::fs::write(&path, r#"{"mcpServers":{"git":{"command":"old"},"keep":{"command":"k"}}}"#)
        .unwrap();

    env.command()
        .args(["autoinstall", r#"{"git":{"command":"uvx","args":["mcp-server-git"]}}"#, "--path"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Successfully installed 1 server(s)"))
        .stdout(predicate::str::contains("Replaced existing servers: git"));

    assert_eq!(
        read_json(&path),
        json!({"mcpServers": {
            "git": {"command": "uvx", "args": ["mcp-server-git"]},
            "keep": {"command": "k"}
        }})
    );
}

#[test]
fn test_autoinstall_client_creates_config_with_force() {
    let env = TestEnv::new();
    env.command()
        .args(["autoinstall", "windsurf", r#"{"a":{"command":"x"}}"#, "--force"])
        .assert()
        .success();

    let written = read_json(&env.path(".codeium/windsurf/mcp_config.json"));
    assert_eq!(written["mcpServers"]["a"]["command"], "x");
}

#[test]
fn test_autoinstall_template() {
    let env = TestEnv::new();
    let path = env.path("mcp.json");
    env.command()
        .args(["autoinstall", "--template", "filesystem", "--path"])
        .arg(&path)
        .assert()
        .success();

    let written = read_json(&path);
    assert!(written["mcpServers"]["filesystem"]["command"].is_string());
}

#[test]
fn test_quiet_suppresses_status_lines() {
    let env = TestEnv::new();
    env.command()
        .args(["-q", "write", "{}", "--path"])
        .arg(env.path("config.json"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
