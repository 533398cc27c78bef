//! Error handling for Toolentry
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** for the failure cases code needs to match on
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ToolentryError`] - enumerated failure cases for configuration handling
//! - [`ErrorContext`] - wrapper adding details and a suggestion for display
//!
//! Failures of the server probe are not part of this enum: the
//! probe converts every failure into a [`crate::probe::ProbeResult`] and never
//! returns an error to its caller. See [`crate::probe::ProbeFailure`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use toolentry_cli::core::{ToolentryError, user_friendly_error};
//!
//! let error = ToolentryError::ClientNotFound {
//!     client: "emacs".to_string(),
//! };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::clients::SupportedClient;

/// Failure cases of the configuration commands.
///
/// Each variant carries the structured fields needed to render a precise
/// message; [`user_friendly_error`] attaches suggestions on top.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolentryError {
    /// The client identifier is not in the registry
    #[error(
        "Client '{client}' is not supported. Run 'toolentry list clients' to see available clients."
    )]
    ClientNotFound {
        /// Identifier given by the user
        client: String,
    },

    /// Neither a client nor `--path` was given
    #[error("Either <client> or --path must be provided")]
    MissingTarget,

    /// The operating system is not one of win32/darwin/linux
    #[error("Platform '{platform}' is not supported. Supported platforms: win32, darwin, linux")]
    PlatformNotSupported {
        /// Name reported by the standard library
        platform: String,
    },

    /// Reading a configuration file failed
    #[error("Failed to read configuration file: {path}")]
    ConfigReadFailed {
        /// File that could not be read
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// Writing a configuration file failed
    #[error("Failed to write configuration file: {path}")]
    ConfigWriteFailed {
        /// File that could not be written
        path: String,
        /// Underlying reason
        reason: String,
    },

    /// The target configuration file does not exist
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Expected location
        path: String,
    },

    /// The configuration directory of the parent application is absent
    #[error("{client} does not appear to be installed on this system.")]
    ClientNotInstalled {
        /// Client whose directory is missing
        client: String,
    },

    /// The parent directory of a target file is missing and `--force` was not given
    #[error("Directory does not exist: {path}")]
    DirectoryMissing {
        /// Missing directory
        path: String,
    },

    /// Access to a file was refused by the operating system
    #[error(
        "Permission denied: Cannot access {path}. Try running with administrator/sudo privileges."
    )]
    PermissionDenied {
        /// File that could not be accessed
        path: String,
    },

    /// User-supplied JSON did not parse
    #[error("Invalid JSON configuration provided")]
    InvalidJson {
        /// Parser message
        reason: String,
    },

    /// JSON parsed but has the wrong shape
    #[error("Invalid MCP server configuration: {reason}")]
    InvalidServerConfig {
        /// What is wrong with it
        reason: String,
    },

    /// Positional arguments do not match the expected form
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// What is wrong with them
        reason: String,
        /// Usage line to show
        usage: String,
    },

    /// A probe timeout outside the accepted window
    #[error("Invalid timeout. Must be between {min} and {max} milliseconds")]
    InvalidTimeout {
        /// Lower bound in milliseconds
        min: u64,
        /// Upper bound in milliseconds
        max: u64,
    },

    /// Unknown server template
    #[error("Template '{name}' not found")]
    TemplateNotFound {
        /// Requested template
        name: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error wrapper with details and an actionable suggestion.
///
/// ```rust,no_run
/// use toolentry_cli::core::{ErrorContext, ToolentryError};
///
/// let context = ErrorContext::new(ToolentryError::MissingTarget)
///     .with_suggestion("Pass a client name or --path <file>");
/// context.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ToolentryError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no details or suggestion.
    #[must_use]
    pub const fn new(error: ToolentryError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    ///
    /// Details are displayed in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{} {}", "✗".red(), self.error.to_string().red().bold());

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions.
///
/// Recognizes [`ToolentryError`] and [`std::io::Error`]; everything else is
/// rendered with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(toolentry_error) = error.downcast_ref::<ToolentryError>() {
        return create_error_context(toolentry_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ToolentryError::PermissionDenied {
                    path: "unknown".to_string(),
                })
                .with_suggestion(
                    "Try running with elevated permissions (sudo/Administrator) or check file ownership",
                );
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ToolentryError::Other {
                    message: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(ToolentryError::InvalidJson {
            reason: json_error.to_string(),
        })
        .with_details(json_error.to_string())
        .with_suggestion("Check the JSON syntax: quotes, commas and matching brackets");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ToolentryError::Other {
        message,
    })
}

fn supported_clients_line() -> String {
    format!("Supported clients: {}", SupportedClient::all_ids().join(", "))
}

fn create_error_context(error: ToolentryError) -> ErrorContext {
    let (details, suggestion): (Option<String>, Option<String>) = match &error {
        ToolentryError::ClientNotFound {
            ..
        }
        | ToolentryError::MissingTarget => (None, Some(supported_clients_line())),
        ToolentryError::PlatformNotSupported {
            ..
        } => (None, Some("Use --path to point at the configuration file directly".to_string())),
        ToolentryError::ConfigReadFailed {
            reason,
            ..
        }
        | ToolentryError::ConfigWriteFailed {
            reason,
            ..
        } => (
            Some(reason.clone()),
            Some("Check that the file is valid JSON and that you can access it".to_string()),
        ),
        ToolentryError::ConfigNotFound {
            ..
        } => (
            None,
            Some("Create it with 'toolentry write' or 'toolentry autoinstall --force'".to_string()),
        ),
        ToolentryError::ClientNotInstalled {
            ..
        } => (
            None,
            Some("Install and start the client once so it creates its configuration".to_string()),
        ),
        ToolentryError::DirectoryMissing {
            ..
        } => (None, Some("Re-run with --force to create it".to_string())),
        ToolentryError::PermissionDenied {
            ..
        } => (None, Some("Check file and directory permissions".to_string())),
        ToolentryError::InvalidJson {
            reason,
        } => (
            Some(reason.clone()),
            Some("Wrap the JSON in single quotes so the shell keeps it intact".to_string()),
        ),
        ToolentryError::InvalidServerConfig {
            ..
        } => (
            None,
            Some(
                r#"Example: {"my-server": {"command": "npx", "args": ["my-mcp-server"]}}"#
                    .to_string(),
            ),
        ),
        ToolentryError::InvalidArguments {
            usage,
            ..
        } => (None, Some(format!("Usage: {usage}"))),
        ToolentryError::InvalidTimeout {
            ..
        } => (None, Some("Example: --timeout 10000".to_string())),
        ToolentryError::TemplateNotFound {
            ..
        } => (None, Some("Run 'toolentry list templates' to see available templates".to_string())),
        ToolentryError::Other {
            ..
        } => (None, None),
    };

    ErrorContext {
        error,
        suggestion,
        details,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_not_found_lists_supported_clients() {
        let ctx = user_friendly_error(anyhow::Error::from(ToolentryError::ClientNotFound {
            client: "emacs".to_string(),
        }));

        assert!(ctx.error.to_string().contains("'emacs' is not supported"));
        let suggestion = ctx.suggestion.unwrap();
        assert!(suggestion.contains("claude-desktop"));
        assert!(suggestion.contains("gemini-cli"));
    }

    #[test]
    fn test_io_permission_error_is_recognized() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let ctx = user_friendly_error(anyhow::Error::from(io));
        assert!(matches!(ctx.error, ToolentryError::PermissionDenied { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_json_error_is_recognized() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let ctx = user_friendly_error(anyhow::Error::from(err));
        assert_eq!(ctx.error.to_string(), "Invalid JSON configuration provided");
        assert!(ctx.details.is_some());
    }

    #[test]
    fn test_generic_error_keeps_cause_chain() {
        let err = anyhow::anyhow!("disk on fire").context("Failed to save");
        let ctx = user_friendly_error(err);
        let text = ctx.to_string();
        assert!(text.starts_with("Failed to save"));
        assert!(text.contains("Caused by:"));
        assert!(text.contains("disk on fire"));
    }

    #[test]
    fn test_display_formats_details_and_suggestion() {
        let ctx = ErrorContext::new(ToolentryError::MissingTarget)
            .with_details("nothing to do")
            .with_suggestion("pass a client");
        assert_eq!(
            ctx.to_string(),
            "Either <client> or --path must be provided\nDetails: nothing to do\nSuggestion: pass a client"
        );
    }
}
