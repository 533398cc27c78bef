use predicates::prelude::*;

use super::TestEnv;

#[test]
fn test_list_clients_marks_existing_configs() {
    let env = TestEnv::new();
    let path = env.path(".gemini/mcp-config.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{}").unwrap();

    env.command()
        .args(["list", "clients"])
        .assert()
        .success()
        .stdout(predicate::str::contains("claude-desktop"))
        .stdout(predicate::str::contains("✓ gemini-cli"));
}

#[test]
fn test_list_templates() {
    env_command_contains(&["list", "templates"], &["toolentry", "filesystem", "postgres"]);
}

fn env_command_contains(args: &[&str], needles: &[&str]) {
    let env = TestEnv::new();
    let mut assert = env.command().args(args).assert().success();
    for needle in needles {
        assert = assert.stdout(predicate::str::contains(*needle));
    }
}
