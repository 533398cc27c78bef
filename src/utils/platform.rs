//! Platform-specific utilities and cross-platform compatibility helpers
//!
//! Home directory resolution, path expansion for user-supplied `--path`
//! values, and the shell used to run `toolentry exec` command lines.
//!
//! # Examples
//!
//! ```rust,no_run
//! use toolentry_cli::utils::platform::{get_home_dir, resolve_path};
//!
//! # fn example() -> anyhow::Result<()> {
//! let home = get_home_dir()?;
//! let config = resolve_path("~/.codeium/windsurf/mcp_config.json")?;
//! assert!(config.starts_with(&home));
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Gets the home directory path for the current user.
///
/// # Platform Behavior
///
/// - **Windows**: `%USERPROFILE%`
/// - **Unix/macOS**: `$HOME`
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        let platform_help = if is_windows() {
            "On Windows: Check that the USERPROFILE environment variable is set"
        } else {
            "On Unix/Linux: Check that the HOME environment variable is set"
        };
        anyhow::anyhow!("Could not determine home directory.\n\n{platform_help}")
    })
}

/// Resolves a path with tilde expansion and environment variable substitution.
///
/// Supports `~/path`, `$VAR/path` and `${VAR}/path`. Only the current user's
/// home is expanded; `~user/path` is rejected.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(stripped) = path.strip_prefix("~/") {
        get_home_dir()?.join(stripped)
    } else if path == "~" {
        get_home_dir()?
    } else if path.starts_with('~') {
        return Err(anyhow::anyhow!(
            "Invalid path: {path}\n\n\
            Tilde expansion only supports '~/' for home directory.\n\
            Use '~/' followed by a relative path, like '~/Documents/file.json'"
        ));
    } else {
        PathBuf::from(path)
    };

    let path_str = expanded.to_string_lossy();
    let expanded_str = shellexpand::env(&path_str)
        .with_context(|| {
            format!(
                "Failed to expand environment variables in path: {path_str}\n\n\
                Common issues:\n\
                - Undefined environment variable (e.g., $UNDEFINED_VAR)\n\
                - Invalid variable syntax (use $VAR or ${{VAR}})"
            )
        })?
        .into_owned();

    Ok(PathBuf::from(expanded_str))
}

/// Returns the shell program and the flag that makes it run one command string.
///
/// - **Windows**: `cmd /C`
/// - **Unix-like**: `sh -c`
#[must_use]
pub const fn shell_invocation() -> (&'static str, &'static str) {
    if is_windows() {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}
