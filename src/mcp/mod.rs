//! Operations on MCP client configuration documents.
//!
//! Client files differ in shape: most keep servers under `mcpServers`, VS Code
//! style files under `servers`, and some carry unrelated settings next to
//! them. Everything here works on [`serde_json::Value`] so unknown content is
//! preserved byte-for-byte in meaning.
//!
//! ```json
//! {
//!   "theme": "dark",
//!   "mcpServers": {
//!     "filesystem": { "command": "npx", "args": ["@modelcontextprotocol/server-filesystem"] }
//!   }
//! }
//! ```

use serde_json::{Map, Value};

use crate::core::ToolentryError;

/// Key holding the server map in most clients.
pub const MCP_SERVERS_KEY: &str = "mcpServers";

/// Key holding the server map in VS Code style documents.
pub const SERVERS_KEY: &str = "servers";

/// Summary of a [`merge_servers`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Key the servers were written under
    pub servers_key: &'static str,
    /// Names that were added or replaced, in input order
    pub installed: Vec<String>,
    /// Names that already existed and were replaced
    pub replaced: Vec<String>,
    /// Servers in the document after merging
    pub total_servers: usize,
}

/// Bring an arbitrary document into a mergeable shape.
///
/// Non-objects and empty objects become `{"mcpServers": {}}`; any other
/// object is returned unchanged.
#[must_use]
pub fn normalize_config(existing: Value) -> Map<String, Value> {
    match existing {
        Value::Object(map) if !map.is_empty() => map,
        _ => {
            let mut map = Map::new();
            map.insert(MCP_SERVERS_KEY.to_string(), Value::Object(Map::new()));
            map
        }
    }
}

/// The key under which `config` keeps its servers.
///
/// `mcpServers` wins over `servers`; a document with neither gets `mcpServers`.
#[must_use]
pub fn servers_key(config: &Map<String, Value>) -> &'static str {
    if config.contains_key(MCP_SERVERS_KEY) {
        MCP_SERVERS_KEY
    } else if config.contains_key(SERVERS_KEY) {
        SERVERS_KEY
    } else {
        MCP_SERVERS_KEY
    }
}

/// Merge `new_servers` into `existing`, replacing entries with the same name.
///
/// Returns the merged document and what changed. A servers entry that is not
/// an object is replaced by `new_servers` outright.
#[must_use]
pub fn merge_servers(existing: Value, new_servers: Map<String, Value>) -> (Value, MergeOutcome) {
    let mut config = normalize_config(existing);
    let key = servers_key(&config);

    let mut servers = match config.remove(key) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let mut installed = Vec::with_capacity(new_servers.len());
    let mut replaced = Vec::new();
    for (name, server) in new_servers {
        if servers.insert(name.clone(), server).is_some() {
            replaced.push(name.clone());
        }
        installed.push(name);
    }

    let total_servers = servers.len();
    config.insert(key.to_string(), Value::Object(servers));

    (
        Value::Object(config),
        MergeOutcome {
            servers_key: key,
            installed,
            replaced,
            total_servers,
        },
    )
}

/// Recursively merge `source` into `target`.
///
/// Objects merge key by key; arrays and scalars from `source` replace what
/// `target` had.
#[must_use]
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_value) in source_map {
                let merged = match target_map.remove(&key) {
                    Some(target_value) => deep_merge(target_value, source_value),
                    None => source_value,
                };
                target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Validate the `servers` argument of `autoinstall`.
///
/// Accepts an object mapping names to server definitions. Rejects non-objects,
/// empty objects, and a bare server definition that was not wrapped in a name.
pub fn parse_servers_argument(value: Value) -> Result<Map<String, Value>, ToolentryError> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(ToolentryError::InvalidServerConfig {
                reason: format!("expected an object of named servers, got {}", type_name(&other)),
            });
        }
    };

    if map.contains_key("command") {
        return Err(ToolentryError::InvalidServerConfig {
            reason: "Single server config must be wrapped with a server name".to_string(),
        });
    }

    if map.is_empty() {
        return Err(ToolentryError::InvalidServerConfig {
            reason: "No servers provided in configuration".to_string(),
        });
    }

    Ok(map)
}

/// Commands of `servers` that cannot be found on `PATH`.
///
/// Entries without a string `command` (HTTP servers) are skipped.
#[must_use]
pub fn missing_commands(servers: &Map<String, Value>) -> Vec<(String, String)> {
    servers
        .iter()
        .filter_map(|(name, server)| {
            let command = server.get("command")?.as_str()?;
            which::which(command).is_err().then(|| (name.clone(), command.to_string()))
        })
        .collect()
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
