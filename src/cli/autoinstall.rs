//! `toolentry autoinstall`: merge named MCP servers into a client's config.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};

use super::CliConfig;
use super::common::{
    Target, info, parse_json_argument, prepare_parent, resolve_target, success, warn, write_failure,
};
use crate::core::ToolentryError;
use crate::mcp::{merge_servers, missing_commands, parse_servers_argument};
use crate::templates::{get_template, list_templates};
use crate::utils::{backup_json_file, read_json_file, write_json_file};

/// Auto-install MCP server configurations to a client's config file.
///
/// Positionals are `[client] <servers>`. With `--template` the servers JSON
/// is replaced by the catalog entry, leaving only `[client]`.
#[derive(Debug, Args)]
pub struct AutoinstallCommand {
    /// `[client] <servers>`, or `[client]` with --template
    #[arg(num_args = 0..=2, value_name = "ARGS")]
    args: Vec<String>,

    /// Custom configuration file path
    #[arg(short, long)]
    path: Option<String>,

    /// Create missing parent directories
    #[arg(short, long)]
    force: bool,

    /// Back up the existing config before modifying it
    #[arg(short, long)]
    backup: bool,

    /// Install a server from the template catalog instead of JSON
    #[arg(long, value_name = "NAME")]
    template: Option<String>,
}

impl AutoinstallCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<i32> {
        let (client, servers_json) = self.split_args()?;
        let parsed = match servers_json {
            Some(json) => Some(parse_servers_argument(parse_json_argument(json)?)?),
            None => None,
        };

        let target = resolve_target(config, client, self.path.as_deref())?;
        let servers = match parsed {
            Some(servers) => servers,
            None => self.template_servers(&target)?,
        };
        let path = &target.path;
        tracing::debug!(target: "config", "Target config path: {}", path.display());

        let existing = if path.exists() {
            match read_json_file::<Value>(path) {
                Ok(existing) => {
                    tracing::debug!(target: "config", "Existing configuration found, will merge");
                    if self.backup {
                        if let Some(backup) = backup_json_file(path)? {
                            info(config, format!("Backup created: {}", backup.display()));
                        }
                    }
                    existing
                }
                Err(e) => {
                    warn(
                        config,
                        format!(
                            "Existing configuration is not valid JSON and will be replaced: {}",
                            path.display()
                        ),
                    );
                    tracing::debug!(target: "config", "{e:#}");
                    Value::Object(Map::new())
                }
            }
        } else {
            tracing::debug!(target: "config", "No existing configuration found, will create new");
            prepare_parent(path, self.force)?;
            Value::Object(Map::new())
        };

        for (name, command) in missing_commands(&servers) {
            warn(config, format!("Server '{name}' uses '{command}', which was not found in PATH"));
        }

        let (merged, outcome) = merge_servers(existing, servers);
        write_json_file(path, &merged).map_err(|e| write_failure(path, &e))?;

        success(
            config,
            format!(
                "Successfully installed {} server(s) to {}",
                outcome.installed.len(),
                path.display()
            ),
        );
        info(config, format!("Installed servers: {}", outcome.installed.join(", ")));
        if !outcome.replaced.is_empty() {
            info(config, format!("Replaced existing servers: {}", outcome.replaced.join(", ")));
        }
        tracing::debug!(
            target: "config",
            "Total servers in config: {} (under '{}')",
            outcome.total_servers,
            outcome.servers_key
        );
        Ok(0)
    }

    fn split_args(&self) -> Result<(Option<&str>, Option<&str>), ToolentryError> {
        match (self.template.is_some(), self.args.as_slice()) {
            (true, []) => Ok((None, None)),
            (true, [client]) => Ok((Some(client.as_str()), None)),
            (false, [servers]) => Ok((None, Some(servers.as_str()))),
            (false, [client, servers]) => Ok((Some(client.as_str()), Some(servers.as_str()))),
            (true, _) => Err(ToolentryError::InvalidArguments {
                reason: "With --template, provide at most the client name".to_string(),
                usage: "autoinstall [client] --template <name>".to_string(),
            }),
            (false, _) => Err(ToolentryError::InvalidArguments {
                reason: "Provide the servers JSON".to_string(),
                usage: "autoinstall [client] <servers>".to_string(),
            }),
        }
    }

    fn template_servers(&self, target: &Target) -> Result<Map<String, Value>> {
        let name = self.template.as_deref().unwrap_or_default();
        let template = get_template(name).ok_or_else(|| {
            tracing::debug!(
                target: "config",
                "Available templates: {}",
                list_templates().join(", ")
            );
            ToolentryError::TemplateNotFound {
                name: name.to_string(),
            }
        })?;
        let cwd = std::env::current_dir().context("Failed to determine the current directory")?;
        let custom_path = target.custom.then_some(target.path.as_path());
        Ok(template.generate(target.client, custom_path, &cwd))
    }
}
