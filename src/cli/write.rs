//! `toolentry write`: replace or merge a configuration file.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::CliConfig;
use super::common::{
    info, parse_json_argument, prepare_parent, resolve_target, success, write_failure,
};
use crate::clients::SupportedClient;
use crate::core::ToolentryError;
use crate::mcp::deep_merge;
use crate::utils::{backup_json_file, read_json_file, write_json_file};

/// Write a configuration file for a client or a custom path.
///
/// Positionals are `<client> <config>`, or just `<config>` with `--path`.
#[derive(Debug, Args)]
pub struct WriteCommand {
    /// `<client> <config>`, or `<config>` when --path is given
    #[arg(required = true, num_args = 1.., value_name = "ARGS")]
    args: Vec<String>,

    /// Custom configuration file path
    #[arg(short, long)]
    path: Option<String>,

    /// Create missing parent directories
    #[arg(short, long)]
    force: bool,

    /// Deep-merge into the existing document instead of replacing it
    #[arg(short, long)]
    merge: bool,
}

impl WriteCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<i32> {
        let (client, content) = self.split_args()?;
        let document = parse_json_argument(content)?;
        let target = resolve_target(config, client, self.path.as_deref())?;
        let path = &target.path;
        tracing::debug!(target: "config", "Writing config to: {}", path.display());

        prepare_parent(path, self.force)?;

        if let Some(backup) = backup_json_file(path)? {
            info(config, format!("Backup created: {}", backup.display()));
        }

        let document = if self.merge && path.exists() {
            match read_json_file::<Value>(path) {
                Ok(existing) => deep_merge(existing, document),
                Err(e) => {
                    tracing::debug!(target: "config", "Existing file not merged: {e:#}");
                    document
                }
            }
        } else {
            document
        };

        write_json_file(path, &document).map_err(|e| write_failure(path, &e))?;
        success(config, format!("Configuration written successfully to: {}", path.display()));
        Ok(0)
    }

    fn split_args(&self) -> Result<(Option<&str>, &str), ToolentryError> {
        match (self.path.is_some(), self.args.as_slice()) {
            (true, [content]) => Ok((None, content.as_str())),
            (true, _) => Err(ToolentryError::InvalidArguments {
                reason: "When using --path, provide only the config JSON".to_string(),
                usage: "write <config> --path <file>".to_string(),
            }),
            (false, [client, content]) => Ok((Some(client.as_str()), content.as_str())),
            (false, _) => Err(ToolentryError::InvalidArguments {
                reason: "Without --path, provide both client name and config JSON".to_string(),
                usage: format!(
                    "write <client> <config>  (clients: {})",
                    SupportedClient::all_ids().join(", ")
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn quiet() -> CliConfig {
        CliConfig {
            quiet: true,
            ..CliConfig::default()
        }
    }

    fn command(path: &std::path::Path, args: &[&str]) -> WriteCommand {
        WriteCommand {
            args: args.iter().map(|s| (*s).to_string()).collect(),
            path: Some(path.to_string_lossy().into_owned()),
            force: false,
            merge: false,
        }
    }

    #[test]
    fn test_split_args_by_mode() {
        let temp = tempdir().unwrap();
        let with_path = command(temp.path(), &["{}"]);
        assert_eq!(with_path.split_args().unwrap(), (None, "{}"));

        let too_many = command(temp.path(), &["cursor", "{}"]);
        assert!(too_many.split_args().is_err());

        let mut without_path = command(temp.path(), &["cursor", "{}"]);
        without_path.path = None;
        assert_eq!(without_path.split_args().unwrap(), (Some("cursor"), "{}"));

        without_path.args.pop();
        assert!(matches!(
            without_path.split_args(),
            Err(ToolentryError::InvalidArguments { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_creates_file_and_backup() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, r#"{"old": true}"#).unwrap();

        command(&path, &[r#"{"mcpServers": {}}"#]).execute(&quiet()).await.unwrap();

        let written: Value = read_json_file(&path).unwrap();
        assert_eq!(written, json!({"mcpServers": {}}));

        let backups: Vec<_> = std::fs::read_dir(temp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("config.json.backup."))
            .collect();
        assert_eq!(backups.len(), 1);
        let backup: Value = read_json_file(&backups[0].path()).unwrap();
        assert_eq!(backup, json!({"old": true}));
    }

    #[tokio::test]
    async fn test_write_merge_keeps_existing_keys() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        let existing = r#"{"theme": "dark", "mcpServers": {"a": {"command": "x"}}}"#;
        std::fs::write(&path, existing).unwrap();

        let mut cmd = command(&path, &[r#"{"mcpServers": {"b": {"command": "y"}}}"#]);
        cmd.merge = true;
        cmd.execute(&quiet()).await.unwrap();

        let written: Value = read_json_file(&path).unwrap();
        assert_eq!(
            written,
            json!({"theme": "dark", "mcpServers": {"a": {"command": "x"}, "b": {"command": "y"}}})
        );
    }

    #[tokio::test]
    async fn test_write_requires_force_for_missing_directory() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested").join("config.json");

        let err = command(&path, &["{}"]).execute(&quiet()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolentryError>(),
            Some(ToolentryError::DirectoryMissing { .. })
        ));

        let mut forced = command(&path, &["{}"]);
        forced.force = true;
        forced.execute(&quiet()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_write_rejects_invalid_json() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.json");
        let err = command(&path, &["{not json"]).execute(&quiet()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolentryError>(),
            Some(ToolentryError::InvalidJson { .. })
        ));
        assert!(!path.exists());
    }
}
