use super::{TestEnv, stdout_json};

#[cfg(unix)]
#[test]
fn test_exec_reports_output() {
    let env = TestEnv::new();
    let output = env.command().args(["exec", "echo", "hello", "world"]).output().unwrap();

    assert!(output.status.success());
    let result = stdout_json(&output);
    assert_eq!(result["success"], true);
    assert_eq!(result["exit_code"], 0);
    assert_eq!(result["stdout"], "hello world");
    assert_eq!(result["command_line"], "echo hello world");
    assert_eq!(result["timed_out"], false);
    assert!(result["execution_time"].is_u64());
}

#[cfg(unix)]
#[test]
fn test_exec_forwards_exit_code_and_stderr() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["exec", "echo oops >&2; exit 3"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let result = stdout_json(&output);
    assert_eq!(result["success"], false);
    assert_eq!(result["exit_code"], 3);
    assert_eq!(result["stderr"], "oops");
}

#[cfg(unix)]
#[test]
fn test_exec_timeout() {
    let env = TestEnv::new();
    let output = env
        .command()
        .args(["exec", "--timeout", "300", "sleep", "10"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let result = stdout_json(&output);
    assert_eq!(result["timed_out"], true);
    assert_eq!(result["success"], false);
}

#[cfg(unix)]
#[test]
fn test_exec_working_directory() {
    let env = TestEnv::new();
    std::fs::create_dir(env.path("work")).unwrap();
    let output = env.command().args(["exec", "-c", "work", "pwd"]).output().unwrap();

    let result = stdout_json(&output);
    let reported = std::path::PathBuf::from(result["stdout"].as_str().unwrap());
    assert_eq!(
        reported.canonicalize().unwrap(),
        env.path("work").canonicalize().unwrap()
    );
}
