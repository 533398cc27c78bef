//! `toolentry read`: print a client's configuration as JSON.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use super::common::resolve_target;
use crate::clients::looks_installed;
use crate::core::ToolentryError;
use crate::utils::read_json_file;

/// Read the configuration file of a client or a custom path.
#[derive(Debug, Args)]
pub struct ReadCommand {
    /// Client name (see `toolentry list clients`); optional with --path
    client: Option<String>,

    /// Custom configuration file path
    #[arg(short, long)]
    path: Option<String>,
}

impl ReadCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<i32> {
        let document = self.load(config)?;
        println!("{}", serde_json::to_string_pretty(&document)?);
        Ok(0)
    }

    fn load(&self, config: &CliConfig) -> Result<serde_json::Value> {
        let target = resolve_target(config, self.client.as_deref(), self.path.as_deref())?;
        tracing::debug!(target: "config", "Reading config from: {}", target.path.display());

        if !target.path.exists() {
            if let Some(client) = target.client.filter(|_| !target.custom) {
                if !looks_installed(&target.path, client) {
                    return Err(ToolentryError::ClientNotInstalled {
                        client: client.to_string(),
                    }
                    .into());
                }
            }
            return Err(ToolentryError::ConfigNotFound {
                path: target.path.display().to_string(),
            }
            .into());
        }

        read_json_file(&target.path).map_err(|e| {
            ToolentryError::ConfigReadFailed {
                path: target.path.display().to_string(),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }
}
