//! Command-line interface for Toolentry.
//!
//! # Commands
//!
//! - `read` - print a client's MCP configuration
//! - `write` - replace (or deep-merge into) a configuration file
//! - `autoinstall` - add named servers to a client's configuration
//! - `exec` - run a shell command and report its result as JSON
//! - `test` - probe an MCP server launch command
//! - `list` - show supported clients or server templates
//!
//! Global flags are folded once into a [`CliConfig`] which is passed down
//! explicitly; nothing below this module reads verbosity from the
//! environment.
//!
//! ```bash
//! toolentry read claude-desktop
//! toolentry autoinstall cursor --template filesystem
//! toolentry test '{"command":"npx","args":["@modelcontextprotocol/server-git"]}' --type protocol
//! toolentry exec -t 60000 npm install -g @modelcontextprotocol/server-git
//! ```

mod autoinstall;
mod common;
mod exec;
mod list;
mod read;
mod write;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive used when `RUST_LOG` is unset.
    ///
    /// `None` means the default of `warn`.
    pub log_level: Option<String>,

    /// Suppress status lines; only errors and command output are printed.
    pub quiet: bool,
}

impl CliConfig {
    /// Configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter for the tracing subscriber. `RUST_LOG` wins over the flags.
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_deref().unwrap_or("warn")))
    }

    /// Install the global tracing subscriber, writing to stderr.
    ///
    /// Stdout is reserved for command output so JSON stays parseable.
    /// Calling this more than once is harmless.
    pub fn init_logging(&self) {
        let debug = matches!(self.log_level.as_deref(), Some("debug" | "trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(debug)
            .without_time()
            .try_init();
    }
}

/// Top-level command line.
#[derive(Debug, Parser)]
#[command(
    name = "toolentry",
    about = "Toolentry CLI - MCP server configuration management",
    version,
    long_about = "Read, write and merge the MCP server configuration of AI clients, \
                  run setup commands, and smoke-test MCP servers."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug-level) logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Enable trace-level logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    debug: bool,

    /// Only print errors and command output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Read the configuration file of a client or custom path
    Read(read::ReadCommand),

    /// Write a configuration file for a client or custom path
    Write(write::WriteCommand),

    /// Execute a system command and report the result as JSON
    Exec(exec::ExecCommand),

    /// Test an MCP server configuration
    Test(test::TestCommand),

    /// Add MCP server configurations to a client's config file
    Autoinstall(autoinstall::AutoinstallCommand),

    /// List supported clients or server templates
    List(list::ListCommand),
}

impl Cli {
    /// Execute with a configuration built from the parsed flags.
    ///
    /// Returns the process exit status.
    pub async fn execute(self) -> Result<i32> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate global flags into a [`CliConfig`].
    ///
    /// `--debug` wins over `--verbose`; `--quiet` keeps errors only.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.debug {
            Some("trace".to_string())
        } else if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
        }
    }

    /// Execute with an explicit configuration.
    ///
    /// Commands that print a JSON result (`exec`, `test`) report failure
    /// through the returned exit status; the others return errors.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<i32> {
        match self.command {
            Commands::Read(cmd) => cmd.execute(&config).await,
            Commands::Write(cmd) => cmd.execute(&config).await,
            Commands::Exec(cmd) => cmd.execute(&config).await,
            Commands::Test(cmd) => cmd.execute(&config).await,
            Commands::Autoinstall(cmd) => cmd.execute(&config).await,
            Commands::List(cmd) => cmd.execute(&config).await,
        }
    }
}
