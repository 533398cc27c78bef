//! `toolentry list`: supported clients and server templates.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use super::CliConfig;
use crate::clients::{Platform, PlatformDirs, SupportedClient, resolve_path};
use crate::templates::template_help;

/// List supported clients or server templates.
#[derive(Debug, Args)]
pub struct ListCommand {
    #[command(subcommand)]
    what: ListTarget,
}

#[derive(Debug, Subcommand)]
enum ListTarget {
    /// Supported clients and their configuration path on this machine
    Clients,
    /// Server templates usable with `autoinstall --template`
    Templates,
}

impl ListCommand {
    pub async fn execute(self, _config: &CliConfig) -> Result<i32> {
        match self.what {
            ListTarget::Clients => {
                let platform = Platform::current()?;
                let dirs = PlatformDirs::from_env()?;
                print!("{}", client_table(platform, &dirs));
            }
            ListTarget::Templates => {
                println!("{}", "Available templates:".bold());
                println!("{}", template_help());
            }
        }
        Ok(0)
    }
}

/// One line per client: id, path, and a ✓ when the file exists.
fn client_table(platform: Platform, dirs: &PlatformDirs) -> String {
    let width = SupportedClient::ALL.iter().map(|c| c.id().len()).max().unwrap_or(0);
    let mut out = String::new();
    for client in SupportedClient::ALL {
        let path = resolve_path(client, platform, dirs);
        let marker = if path.exists() { "✓".green().to_string() } else { " ".to_string() };
        out.push_str(&format!("{marker} {:width$}  {}\n", client.id(), path.display()));
    }
    out
}
