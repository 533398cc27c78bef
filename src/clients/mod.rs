//! Registry of supported AI clients and where they keep their MCP configuration.
//!
//! Path resolution is a pure function of the client, the [`Platform`] and a
//! [`PlatformDirs`] snapshot, so every platform's table can be tested from any
//! host.
//!
//! | Client | Location (relative to) |
//! |--------|------------------------|
//! | `claude-desktop` | config base: `Claude/claude_desktop_config.json` |
//! | `cline` | VS Code storage: `saoudrizwan.claude-dev/settings/cline_mcp_settings.json` |
//! | `windsurf` | home: `.codeium/windsurf/mcp_config.json` |
//! | `cursor` | config base: `Cursor/User/globalStorage/mcp-servers/config.json` |
//! | `vscode` | VS Code storage: `mcp/mcp.json` |
//! | ... | see [`SupportedClient::relative_path`] |

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::core::ToolentryError;

/// An AI client whose configuration file Toolentry knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SupportedClient {
    /// Claude Desktop app
    ClaudeDesktop,
    /// Cline VS Code extension
    Cline,
    /// Codeium Windsurf editor
    Windsurf,
    /// Roo Code VS Code extension
    Roocode,
    /// Witsy desktop app
    Witsy,
    /// Enconvo desktop app
    Enconvo,
    /// Cursor editor
    Cursor,
    /// VS Code (stable)
    Vscode,
    /// VS Code Insiders
    VscodeInsiders,
    /// BoltAI desktop app
    Boltai,
    /// Amazon Bedrock tooling
    AmazonBedrock,
    /// Amazon Q extension
    Amazonq,
    /// LibreChat
    Librechat,
    /// Gemini CLI
    GeminiCli,
}

/// Anchor directory a client's configuration path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Home,
    ConfigBase,
    VsCodeStorage,
    VsCodeInsidersStorage,
}

impl SupportedClient {
    /// Every client, in display order.
    pub const ALL: [Self; 14] = [
        Self::ClaudeDesktop,
        Self::Cline,
        Self::Windsurf,
        Self::Roocode,
        Self::Witsy,
        Self::Enconvo,
        Self::Cursor,
        Self::Vscode,
        Self::VscodeInsiders,
        Self::Boltai,
        Self::AmazonBedrock,
        Self::Amazonq,
        Self::Librechat,
        Self::GeminiCli,
    ];

    /// The identifier used on the command line.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::ClaudeDesktop => "claude-desktop",
            Self::Cline => "cline",
            Self::Windsurf => "windsurf",
            Self::Roocode => "roocode",
            Self::Witsy => "witsy",
            Self::Enconvo => "enconvo",
            Self::Cursor => "cursor",
            Self::Vscode => "vscode",
            Self::VscodeInsiders => "vscode-insiders",
            Self::Boltai => "boltai",
            Self::AmazonBedrock => "amazon-bedrock",
            Self::Amazonq => "amazonq",
            Self::Librechat => "librechat",
            Self::GeminiCli => "gemini-cli",
        }
    }

    /// All identifiers, in display order.
    #[must_use]
    pub fn all_ids() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.id()).collect()
    }

    const fn anchor(self) -> Anchor {
        match self {
            Self::Windsurf | Self::AmazonBedrock | Self::GeminiCli => Anchor::Home,
            Self::ClaudeDesktop
            | Self::Witsy
            | Self::Enconvo
            | Self::Cursor
            | Self::Boltai
            | Self::Librechat => Anchor::ConfigBase,
            Self::Cline | Self::Roocode | Self::Vscode | Self::Amazonq => Anchor::VsCodeStorage,
            Self::VscodeInsiders => Anchor::VsCodeInsidersStorage,
        }
    }

    /// Path components below the client's anchor directory.
    #[must_use]
    pub const fn relative_path(self) -> &'static [&'static str] {
        match self {
            Self::ClaudeDesktop => &["Claude", "claude_desktop_config.json"],
            Self::Cline => &["saoudrizwan.claude-dev", "settings", "cline_mcp_settings.json"],
            Self::Windsurf => &[".codeium", "windsurf", "mcp_config.json"],
            Self::Roocode => &["rooveterinaryinc.roo-cline", "settings", "cline_mcp_settings.json"],
            Self::Witsy => &["witsy", "config.json"],
            Self::Enconvo => &["enconvo", "config.json"],
            Self::Cursor => &["Cursor", "User", "globalStorage", "mcp-servers", "config.json"],
            Self::Vscode | Self::VscodeInsiders => &["mcp", "mcp.json"],
            Self::Boltai => &["boltai", "config.json"],
            Self::AmazonBedrock => &[".aws", "mcp", "bedrock-config.json"],
            Self::Amazonq => &["amazonq", "mcp-config.json"],
            Self::Librechat => &["librechat", "mcp-config.json"],
            Self::GeminiCli => &[".gemini", "mcp-config.json"],
        }
    }
}

impl fmt::Display for SupportedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SupportedClient {
    type Err = ToolentryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|c| c.id() == s).ok_or_else(|| {
            ToolentryError::ClientNotFound {
                client: s.to_string(),
            }
        })
    }
}

/// Operating system families with a known configuration layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    /// Windows
    #[serde(rename = "win32")]
    Windows,
    /// macOS
    #[serde(rename = "darwin")]
    MacOs,
    /// Linux
    #[serde(rename = "linux")]
    Linux,
}

impl Platform {
    /// The platform this binary runs on.
    pub fn current() -> Result<Self, ToolentryError> {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform.
    pub fn from_os(os: &str) -> Result<Self, ToolentryError> {
        match os {
            "windows" => Ok(Self::Windows),
            "macos" => Ok(Self::MacOs),
            "linux" => Ok(Self::Linux),
            other => Err(ToolentryError::PlatformNotSupported {
                platform: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Windows => "win32",
            Self::MacOs => "darwin",
            Self::Linux => "linux",
        })
    }
}

/// Directory inputs needed to resolve configuration paths.
///
/// Captured once from the environment by [`PlatformDirs::from_env`]; tests
/// construct it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// User home directory
    pub home: PathBuf,
    /// `%APPDATA%`, when set
    pub app_data: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`, when set
    pub xdg_config_home: Option<PathBuf>,
}

impl PlatformDirs {
    /// Snapshot the home directory and the relevant environment variables.
    pub fn from_env() -> Result<Self> {
        let non_empty = |name: &str| {
            std::env::var_os(name).filter(|v| !v.is_empty()).map(PathBuf::from)
        };

        Ok(Self {
            home: crate::utils::get_home_dir()?,
            app_data: non_empty("APPDATA"),
            xdg_config_home: non_empty("XDG_CONFIG_HOME"),
        })
    }

    /// Directory under which desktop apps keep their configuration.
    #[must_use]
    pub fn base_config_dir(&self, platform: Platform) -> PathBuf {
        match platform {
            Platform::Windows => self
                .app_data
                .clone()
                .unwrap_or_else(|| self.home.join("AppData").join("Roaming")),
            Platform::MacOs => self.home.join("Library").join("Application Support"),
            Platform::Linux => {
                self.xdg_config_home.clone().unwrap_or_else(|| self.home.join(".config"))
            }
        }
    }

    /// VS Code extension storage directory.
    #[must_use]
    pub fn vscode_storage_dir(&self, platform: Platform) -> PathBuf {
        self.base_config_dir(platform).join("Code").join("User").join("globalStorage")
    }

    /// VS Code Insiders extension storage directory.
    #[must_use]
    pub fn vscode_insiders_storage_dir(&self, platform: Platform) -> PathBuf {
        self.base_config_dir(platform).join("Code - Insiders").join("User").join("globalStorage")
    }
}

/// Resolve the configuration file of `client` on `platform`.
#[must_use]
pub fn resolve_path(client: SupportedClient, platform: Platform, dirs: &PlatformDirs) -> PathBuf {
    let anchor = match client.anchor() {
        Anchor::Home => dirs.home.clone(),
        Anchor::ConfigBase => dirs.base_config_dir(platform),
        Anchor::VsCodeStorage => dirs.vscode_storage_dir(platform),
        Anchor::VsCodeInsidersStorage => dirs.vscode_insiders_storage_dir(platform),
    };

    client.relative_path().iter().fold(anchor, |path, part| path.join(part))
}

/// Resolve the configuration file of `client` on the current machine.
pub fn config_path_for(client: SupportedClient) -> Result<PathBuf> {
    let platform = Platform::current()?;
    let dirs = PlatformDirs::from_env()?;
    let path = resolve_path(client, platform, &dirs);
    tracing::debug!(target: "config", "Resolved {client} on {platform} to {}", path.display());
    Ok(path)
}

/// Whether the application owning `config_path` looks installed.
///
/// The first directory below the anchor (e.g. `Claude`, `.codeium`,
/// `saoudrizwan.claude-dev`) is created by the client on first launch.
#[must_use]
pub fn looks_installed(config_path: &Path, client: SupportedClient) -> bool {
    let depth = client.relative_path().len();
    config_path.ancestors().nth(depth - 1).is_some_and(Path::exists)
}
