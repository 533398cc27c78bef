//! Toolentry - MCP server configuration for AI clients
//!
//! Reads, writes and merges the JSON files in which AI clients (Claude
//! Desktop, Cursor, VS Code, Windsurf and others) list their MCP servers,
//! and probes server launch commands before they are installed.
//!
//! # Core Modules
//!
//! - [`cli`] - Command-line interface and subcommands
//! - [`clients`] - Supported clients and their per-platform config paths
//! - [`mcp`] - Config document normalization and server merging
//! - [`probe`] - Startup and MCP protocol liveness tests
//! - [`process`] - Child process supervision with process-tree cleanup
//! - [`exec`] - One-shot shell command execution
//! - [`templates`] - Built-in server template catalog
//!
//! ## Supporting Modules
//! - [`core`] - Error types and user-facing error context
//! - [`constants`] - Timeouts and limits shared across modules
//! - [`utils`] - Path expansion and atomic JSON file operations

pub mod cli;
pub mod clients;
pub mod constants;
pub mod core;
pub mod exec;
pub mod mcp;
pub mod probe;
pub mod process;
pub mod templates;
pub mod utils;
