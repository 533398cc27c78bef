//! Helpers shared by the configuration commands.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Result;
use colored::Colorize;

use super::CliConfig;
use crate::clients::{SupportedClient, config_path_for};
use crate::core::ToolentryError;
use crate::utils::{ensure_parent_dir, resolve_path};

/// Where a command reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Configuration file
    pub path: PathBuf,
    /// Client the path belongs to, when one was named
    pub client: Option<SupportedClient>,
    /// The path came from `--path`
    pub custom: bool,
}

/// Pick the configuration file from a client name and/or `--path`.
///
/// `--path` wins when both are given; the client name is then only kept if
/// it is valid. Without `--path` the client must be known.
pub fn resolve_target(
    config: &CliConfig,
    client: Option<&str>,
    custom_path: Option<&str>,
) -> Result<Target> {
    match (client, custom_path) {
        (None, None) => Err(ToolentryError::MissingTarget.into()),
        (client, Some(raw)) => {
            if client.is_some() {
                warn(config, "Both client and --path provided, using custom path");
            }
            let path = resolve_path(raw)?;
            tracing::debug!(target: "config", "Using custom path: {}", path.display());
            Ok(Target {
                path,
                client: client.and_then(|c| c.parse().ok()),
                custom: true,
            })
        }
        (Some(client), None) => {
            let client: SupportedClient = client.parse()?;
            let path = config_path_for(client)?;
            tracing::debug!(target: "config", "{} config path: {}", client, path.display());
            Ok(Target {
                path,
                client: Some(client),
                custom: false,
            })
        }
    }
}

/// Make sure the parent directory of `path` exists, creating it with `force`.
pub fn prepare_parent(path: &Path, force: bool) -> Result<()> {
    if force {
        return ensure_parent_dir(path);
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => {
            Err(ToolentryError::DirectoryMissing {
                path: parent.display().to_string(),
            }
            .into())
        }
        _ => Ok(()),
    }
}

/// Wrap a failed write, keeping permission problems recognizable.
pub fn write_failure(path: &Path, error: &anyhow::Error) -> ToolentryError {
    let denied = error.chain().any(|cause| {
        cause
            .downcast_ref::<std::io::Error>()
            .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
    });
    if denied {
        ToolentryError::PermissionDenied {
            path: path.display().to_string(),
        }
    } else {
        ToolentryError::ConfigWriteFailed {
            path: path.display().to_string(),
            reason: format!("{error:#}"),
        }
    }
}

/// Parse a JSON argument, reporting the parser message at debug level.
pub fn parse_json_argument(raw: &str) -> Result<serde_json::Value, ToolentryError> {
    serde_json::from_str(raw).map_err(|e| {
        tracing::debug!("JSON parse error: {}", e);
        ToolentryError::InvalidJson {
            reason: e.to_string(),
        }
    })
}

/// `✓ message` on stdout unless quiet.
pub fn success(config: &CliConfig, message: impl Display) {
    if !config.quiet {
        println!("{} {}", "✓".green(), message);
    }
}

/// Plain status line on stdout unless quiet.
pub fn info(config: &CliConfig, message: impl Display) {
    if !config.quiet {
        println!("{message}");
    }
}

/// `⚠ message` on stderr unless quiet.
pub fn warn(config: &CliConfig, message: impl Display) {
    if !config.quiet {
        eprintln!("{} {}", "⚠".yellow(), message);
    }
}
