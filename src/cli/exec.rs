//! `toolentry exec`: run a command line and print the result as JSON.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use crate::constants::DEFAULT_EXEC_TIMEOUT_MS;
use crate::exec::run_shell;
use crate::utils::resolve_path;

/// Execute a system command.
///
/// Words after the command are passed through untouched, including flags
/// such as `--version`.
#[derive(Debug, Args)]
pub struct ExecCommand {
    /// Working directory
    #[arg(short, long)]
    cwd: Option<String>,

    /// Timeout in milliseconds
    #[arg(short, long, default_value_t = DEFAULT_EXEC_TIMEOUT_MS, env = "TOOLENTRY_EXEC_TIMEOUT")]
    timeout: u64,

    /// Command and arguments to execute
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

impl ExecCommand {
    pub async fn execute(self, _config: &CliConfig) -> Result<i32> {
        let command_line = self.command.join(" ");
        let cwd = self.cwd.as_deref().map(resolve_path).transpose()?;

        tracing::debug!(target: "exec", "Executing: {}", command_line);
        if let Some(dir) = &cwd {
            tracing::debug!(target: "exec", "Working directory: {}", dir.display());
        }

        let timeout = Duration::from_millis(self.timeout);
        let result = run_shell(&command_line, cwd.as_deref(), timeout).await;
        println!("{}", serde_json::to_string_pretty(&result)?);

        if !result.success {
            tracing::error!(target: "exec", "Command failed: {}", command_line);
        }
        Ok(result.process_exit_code())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Cli;
    use clap::Parser;

    #[test]
    fn test_flags_after_command_are_passed_through() {
        let cli =
            Cli::try_parse_from(["toolentry", "exec", "-c", "/tmp", "npm", "--version", "-g"]);
        assert!(cli.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_forwarded() {
        let cli = Cli::try_parse_from(["toolentry", "exec", "exit", "7"]).unwrap();
        assert_eq!(cli.execute().await.unwrap(), 7);
    }
}
