//! Integration test suite for Toolentry
//!
//! Drives the built `toolentry` binary against temporary files. `HOME` and
//! the config base variables are redirected so client paths never touch the
//! real user profile.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **config_files**: `read`, `write` and `autoinstall`
//! - **exec**: `exec` JSON result and exit status
//! - **list**: `list clients` and `list templates`
//! - **probe**: `test` startup, protocol and full strategies

mod config_files;
mod exec;
mod list;
mod probe;

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Temporary home directory plus a preconfigured command builder.
pub struct TestEnv {
    pub temp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().unwrap(),
        }
    }

    pub fn home(&self) -> &Path {
        self.temp.path()
    }

    /// A file path inside the temporary home.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.temp.path().join(relative)
    }

    /// `toolentry` with the environment pointed at the temporary home.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("toolentry").unwrap();
        cmd.env("HOME", self.home())
            .env("USERPROFILE", self.home())
            .env("APPDATA", self.home().join("AppData").join("Roaming"))
            .env("NO_COLOR", "1")
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("RUST_LOG")
            .env_remove("TOOLENTRY_TIMEOUT")
            .env_remove("TOOLENTRY_EXEC_TIMEOUT")
            .current_dir(self.home());
        cmd
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!("stdout is not JSON ({e}): {}", String::from_utf8_lossy(&output.stdout))
    })
}
